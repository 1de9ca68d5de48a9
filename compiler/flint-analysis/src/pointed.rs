//! Gathers the set of locals whose address is taken somewhere in a
//! function. These locals must keep addressable storage (they are always
//! spilled) and are exempt from value propagation and dead-code
//! elimination, since writes through pointers can alias them.

use flint_ir::visitor::IrVisitor;
use flint_ir::{Addressable, Function, Instruction, LocalId};
use indexmap::IndexSet;

pub type PointedLocals = IndexSet<LocalId>;

#[derive(Default)]
struct PointedLocalGatherer {
    pointed: PointedLocals,
}

impl IrVisitor for PointedLocalGatherer {
    fn visit_instruction(&mut self, instruction: &Instruction) {
        if let Instruction::AddressOf { source: Addressable::Local(local), .. } = instruction {
            self.pointed.insert(local.id);
        }
    }
}

/// The set of locals `L` such that some `AddressOf(_, L)` exists in `func`.
pub fn pointed_locals(func: &Function) -> PointedLocals {
    let mut gatherer = PointedLocalGatherer::default();
    gatherer.visit_function(func);
    gatherer.pointed
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_ir::{RValue, Terminator, TyId};

    #[test]
    fn only_addressed_locals_are_gathered() {
        let mut func = Function::new("f", TyId::INT);
        let block = func.new_block();
        let x = func.new_local(TyId::INT);
        let y = func.new_local(TyId::INT);
        let p = func.new_local(TyId::pointer_to(TyId::INT));

        func.block_mut(block).push(Instruction::AddressOf {
            dest: p,
            source: Addressable::Local(x),
        });
        func.block_mut(block).push(Instruction::Assignment { dest: y, source: RValue::Local(x) });
        func.block_mut(block).terminate(Terminator::Jump { target: func.epilogue() });
        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: block });

        let pointed = pointed_locals(&func);
        assert!(pointed.contains(&x.id));
        assert!(!pointed.contains(&y.id));
        assert!(!pointed.contains(&p.id));
    }
}
