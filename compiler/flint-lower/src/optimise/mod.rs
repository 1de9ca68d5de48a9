//! The optimisation passes and the fixed-point driver that runs them.
//! Every rewriting pass reports whether it changed anything; the driver
//! loops the whole sequence until a quiet iteration, then renumbers the
//! surviving locals once.
pub mod dce;
pub mod empty_blocks;
pub mod folding;
pub mod propagation;
pub mod renumber;
pub mod reorder;
pub mod two_step;

pub use dce::DeadCodeElimination;
pub use empty_blocks::EmptyBlockElimination;
pub use folding::ConstantFolding;
pub use propagation::ValuePropagation;
pub use renumber::LocalRenumbering;
pub use reorder::BlockReordering;
pub use two_step::TwoStepAssignmentElimination;

use derive_more::Constructor;
use flint_analysis::{pointed_locals, predecessor_map, LivenessAnalysis};
use flint_ir::Function;
use log::debug;

/// Runs the optimisation pipeline over one function at a time.
#[derive(Default, Constructor)]
pub struct Optimiser;

impl Optimiser {
    /// Iterate the pass sequence until no pass reports a change, then
    /// renumber the locals.
    pub fn optimise(&self, func: &mut Function) {
        let mut iteration = 0usize;

        loop {
            let mut changed = false;

            let pointed = pointed_locals(func);
            changed |= ValuePropagation::run(func, &pointed);

            let preds = predecessor_map(func);
            let live = LivenessAnalysis::new(func, &preds).compute();
            changed |= DeadCodeElimination::run(func, &live, &pointed);

            changed |= ConstantFolding::run(func);

            let preds = predecessor_map(func);
            let live = LivenessAnalysis::new(func, &preds).compute();
            changed |= TwoStepAssignmentElimination::run(func, &live, &pointed);

            changed |= EmptyBlockElimination::run(func);
            BlockReordering::run(func);

            iteration += 1;
            debug!("optimiser: `{}` iteration {iteration} changed={changed}", func.name());

            if !changed {
                break;
            }
        }

        LocalRenumbering::run(func);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_ir::{BinOp, Immediate, Instruction, RValue, Terminator, TyId};

    /// return 2 + 3 * 4 collapses to a single constant store of 14.
    #[test]
    fn straight_line_arithmetic_folds_to_a_constant() {
        let mut func = Function::new("main", TyId::INT);
        let entry = func.new_block();
        let t1 = func.new_local(TyId::INT);
        let t2 = func.new_local(TyId::INT);
        let ret = func.return_local();

        let imm = |v: i64| RValue::Immediate(Immediate::new(v, TyId::INT));
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let b = func.block_mut(entry);
        b.push(Instruction::BinaryOp { dest: t1, left: imm(3), right: imm(4), op: BinOp::Mul });
        b.push(Instruction::BinaryOp {
            dest: t2,
            left: imm(2),
            right: RValue::Local(t1),
            op: BinOp::Add,
        });
        b.push(Instruction::Assignment { dest: ret, source: RValue::Local(t2) });
        b.terminate(Terminator::Jump { target: epilogue });

        Optimiser::new().optimise(&mut func);

        let instructions: Vec<_> = func
            .layout()
            .flat_map(|block| func.block(block).instructions.clone())
            .collect();
        assert_eq!(
            instructions,
            vec![Instruction::Assignment { dest: ret, source: imm(14) }]
        );
        // Only the return slot survives renumbering.
        assert_eq!(func.locals.len(), 1);
    }

    /// A constant condition leaves exactly one arm of the diamond alive.
    #[test]
    fn constant_branches_collapse_the_diamond() {
        let mut func = Function::new("f", TyId::INT);
        let cond = func.new_block();
        let then_b = func.new_block();
        let else_b = func.new_block();
        let join = func.new_block();
        let c = func.new_local(TyId::BOOL);
        let ret = func.return_local();

        let imm = |v: i64, ty| RValue::Immediate(Immediate::new(v, ty));
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: cond });
        func.block_mut(cond).push(Instruction::Assignment {
            dest: c,
            source: imm(1, TyId::BOOL),
        });
        func.block_mut(cond).terminate(Terminator::ConditionalJump {
            condition: RValue::Local(c),
            on_true: then_b,
            on_false: else_b,
        });
        func.block_mut(then_b)
            .push(Instruction::Assignment { dest: ret, source: imm(10, TyId::INT) });
        func.block_mut(then_b).terminate(Terminator::Jump { target: join });
        func.block_mut(else_b)
            .push(Instruction::Assignment { dest: ret, source: imm(20, TyId::INT) });
        func.block_mut(else_b).terminate(Terminator::Jump { target: join });
        func.block_mut(join).terminate(Terminator::Jump { target: epilogue });

        Optimiser::new().optimise(&mut func);

        // The false arm is unreachable and dropped from the layout.
        assert!(!func.body.contains(&else_b));
        let instructions: Vec<_> = func
            .layout()
            .flat_map(|block| func.block(block).instructions.clone())
            .collect();
        assert_eq!(
            instructions,
            vec![Instruction::Assignment { dest: ret, source: imm(10, TyId::INT) }]
        );
    }
}
