//! Local renumbering. After the other passes have run, many local ids are
//! unused; this pass collects the set of locals that still appear in the
//! IR (always keeping the return slot and the parameters), rebuilds the
//! local table densely, and remaps every reference through the resulting
//! translation table. The mapping is a bijection on the used set and
//! preserves relative id order, so parameters keep ids `1..=arg_count`.

use std::collections::{BTreeSet, HashMap};

use flint_ir::{Function, LocalId, LocalInfo};
use index_vec::IndexVec;
use log::debug;

pub struct LocalRenumbering;

impl LocalRenumbering {
    pub fn run(func: &mut Function) {
        let mut used: BTreeSet<LocalId> = BTreeSet::new();
        used.insert(func.return_local().id);
        for index in 1..=func.arg_count() {
            used.insert(LocalId::from_usize(index));
        }

        let layout: Vec<_> = func.layout().collect();
        for block in &layout {
            let data = func.block(*block);
            for instruction in &data.instructions {
                instruction.for_each_local(|local| {
                    used.insert(local.id);
                });
            }
            if let Some(terminator) = &data.terminator {
                terminator.for_each_local(|local| {
                    used.insert(local.id);
                });
            }
        }

        let old_locals = std::mem::replace(&mut func.locals, IndexVec::new());
        let mut translation: HashMap<LocalId, LocalId> = HashMap::new();
        let mut new_locals: IndexVec<LocalId, LocalInfo> = IndexVec::new();

        for &old in &used {
            let new_id = new_locals.push(old_locals[old].clone());
            translation.insert(old, new_id);
        }

        debug!(
            "renumbering `{}`: {} locals in use of {}",
            func.name(),
            new_locals.len(),
            old_locals.len()
        );
        func.locals = new_locals;

        for block in layout {
            let data = func.block_mut(block);
            for instruction in data.instructions.iter_mut() {
                instruction.for_each_local_mut(|local| {
                    local.id = translation[&local.id];
                });
            }
            if let Some(terminator) = &mut data.terminator {
                terminator.for_each_local_mut(|local| {
                    local.id = translation[&local.id];
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_ir::{BinOp, Immediate, Instruction, RValue, Terminator, TyId};

    #[test]
    fn ids_become_dense_and_parameters_keep_their_slots() {
        let mut func = Function::new("f", TyId::INT);
        let x = func.new_param("x", TyId::INT);
        let entry = func.new_block();

        // Create a gap: two temporaries, only the second is used.
        let _unused = func.new_local(TyId::INT);
        let t = func.new_local(TyId::INT);
        let ret = func.return_local();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let b = func.block_mut(entry);
        b.push(Instruction::BinaryOp {
            dest: t,
            left: RValue::Local(x),
            right: RValue::Immediate(Immediate::new(1, TyId::INT)),
            op: BinOp::Add,
        });
        b.push(Instruction::Assignment { dest: ret, source: RValue::Local(t) });
        b.terminate(Terminator::Jump { target: epilogue });

        assert_eq!(func.locals.len(), 4);
        LocalRenumbering::run(&mut func);

        // _0 and the parameter survive in place; the used temporary is
        // renumbered into the next dense slot.
        assert_eq!(func.locals.len(), 3);
        let instructions = &func.block(entry).instructions;
        match &instructions[0] {
            Instruction::BinaryOp { dest, left, .. } => {
                assert_eq!(dest.id.index(), 2);
                assert_eq!(left.as_local().unwrap().id.index(), 1);
            }
            other => panic!("unexpected instruction {other:?}"),
        }
        match &instructions[1] {
            Instruction::Assignment { dest, source } => {
                assert_eq!(dest.id.index(), 0);
                assert_eq!(source.as_local().unwrap().id.index(), 2);
            }
            other => panic!("unexpected instruction {other:?}"),
        }
    }
}
