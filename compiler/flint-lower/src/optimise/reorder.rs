//! Block reordering. Follows terminators depth-first from the prologue's
//! jump target and lays the body out in the order blocks are finished,
//! dropping anything unreachable. The prologue and epilogue are separate
//! fields of the function and keep their positions.

use flint_ir::{BlockId, Function};
use indexmap::IndexSet;

pub struct BlockReordering;

impl BlockReordering {
    pub fn run(func: &mut Function) {
        let prologue = func.prologue();
        let epilogue = func.epilogue();

        let mut visited: IndexSet<BlockId> = IndexSet::new();
        let mut to_visit: Vec<BlockId> = Vec::new();
        let mut order: Vec<BlockId> = Vec::new();

        let mut visit_next = |block: BlockId, to_visit: &mut Vec<BlockId>| {
            if block != prologue && block != epilogue && visited.insert(block) {
                to_visit.push(block);
            }
        };

        if let Some(terminator) = &func.block(prologue).terminator {
            for successor in terminator.successors() {
                visit_next(successor, &mut to_visit);
            }
        }

        while let Some(current) = to_visit.pop() {
            if let Some(terminator) = &func.block(current).terminator {
                for successor in terminator.successors() {
                    visit_next(successor, &mut to_visit);
                }
                order.push(current);
            }
        }

        func.body = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_ir::{Terminator, TyId};

    #[test]
    fn unreachable_blocks_are_dropped() {
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let orphan = func.new_block();
        let end = func.new_block();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        func.block_mut(entry).terminate(Terminator::Jump { target: end });
        func.block_mut(orphan).terminate(Terminator::Jump { target: end });
        func.block_mut(end).terminate(Terminator::Jump { target: epilogue });

        BlockReordering::run(&mut func);
        assert!(!func.body.contains(&orphan));
        assert!(func.body.contains(&entry));
        assert!(func.body.contains(&end));
    }

    #[test]
    fn every_reachable_block_appears_exactly_once() {
        let mut func = Function::new("f", TyId::INT);
        let a = func.new_block();
        let b = func.new_block();

        // a and b jump to each other; both reachable from the prologue.
        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: a });
        func.block_mut(a).terminate(Terminator::Jump { target: b });
        func.block_mut(b).terminate(Terminator::Jump { target: a });

        BlockReordering::run(&mut func);
        assert_eq!(func.body.iter().filter(|&&x| x == a).count(), 1);
        assert_eq!(func.body.iter().filter(|&&x| x == b).count(), 1);
    }
}
