//! Dead-code elimination. Walks every block backwards from its live-out
//! set and tombstones any destination-writing instruction whose result is
//! neither live nor addressable. Calls, pointer writes and terminators are
//! never removed: they have side effects or carry control flow.

use flint_analysis::{BlockLivenessMap, PointedLocals};
use flint_ir::{Function, Instruction, RValue, Terminator};

pub struct DeadCodeElimination;

impl DeadCodeElimination {
    pub fn run(func: &mut Function, live: &BlockLivenessMap, pointed: &PointedLocals) -> bool {
        let mut changed = false;

        let layout: Vec<_> = func.layout().collect();
        for block in layout {
            let mut working = live[block].output.clone();
            let data = func.block_mut(block);

            if let Some(Terminator::ConditionalJump { condition: RValue::Local(local), .. }) =
                &data.terminator
            {
                working.insert(local.id);
            }

            for instruction in data.instructions.iter_mut().rev() {
                let removable = match instruction {
                    // Side effects and control flow stay.
                    Instruction::Nop
                    | Instruction::Call { .. }
                    | Instruction::PointerWrite { .. } => false,
                    _ => true,
                };

                if removable {
                    let dest = instruction.destination().unwrap();
                    if !working.contains(&dest.id) && !pointed.contains(&dest.id) {
                        *instruction = Instruction::Nop;
                        changed = true;
                        continue;
                    }
                }

                // Otherwise update the working set exactly as liveness
                // does: def first, then uses.
                if let Some(dest) = instruction.destination() {
                    working.shift_remove(&dest.id);
                }
                let mut mark_used = |rvalue: &RValue| {
                    if let RValue::Local(local) = rvalue {
                        working.insert(local.id);
                    }
                };
                match instruction {
                    Instruction::Nop => {}
                    Instruction::BinaryOp { left, right, .. } => {
                        mark_used(left);
                        mark_used(right);
                    }
                    Instruction::UnaryOp { operand, .. } => mark_used(operand),
                    Instruction::Assignment { source, .. }
                    | Instruction::Cast { source, .. } => mark_used(source),
                    Instruction::Call { args, .. } => {
                        for arg in args {
                            mark_used(arg);
                        }
                    }
                    Instruction::PointerRead { address, .. } => mark_used(address),
                    Instruction::PointerWrite { address, source } => {
                        mark_used(address);
                        mark_used(source);
                    }
                    Instruction::AddressOf { source, .. } => {
                        if let flint_ir::Addressable::Local(local) = source {
                            mark_used(&RValue::Local(*local));
                        }
                    }
                }
            }

            data.compact();
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_analysis::{pointed_locals, predecessor_map, LivenessAnalysis};
    use flint_ir::{Addressable, BinOp, Immediate, TyId};

    fn imm(value: i64) -> RValue {
        RValue::Immediate(Immediate::new(value, TyId::INT))
    }

    fn run(func: &mut Function) -> bool {
        let preds = predecessor_map(func);
        let live = LivenessAnalysis::new(func, &preds).compute();
        let pointed = pointed_locals(func);
        DeadCodeElimination::run(func, &live, &pointed)
    }

    #[test]
    fn unused_results_are_dropped_but_side_effects_stay() {
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let dead = func.new_local(TyId::INT);
        let call_dest = func.new_local(TyId::INT);
        let ret = func.return_local();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let epilogue = func.epilogue();
        let b = func.block_mut(entry);
        b.push(Instruction::BinaryOp { dest: dead, left: imm(1), right: imm(2), op: BinOp::Add });
        b.push(Instruction::Call {
            dest: call_dest,
            name: "getchar".to_string(),
            args: vec![],
            variadic: false,
        });
        b.push(Instruction::Assignment { dest: ret, source: imm(0) });
        b.terminate(Terminator::Jump { target: epilogue });

        assert!(run(&mut func));
        let instructions = &func.block(entry).instructions;
        assert_eq!(instructions.len(), 2);
        assert!(matches!(instructions[0], Instruction::Call { .. }));
        assert!(matches!(instructions[1], Instruction::Assignment { .. }));
    }

    #[test]
    fn addressed_locals_survive() {
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let x = func.new_local(TyId::INT);
        let p = func.new_local(TyId::pointer_to(TyId::INT));
        let ret = func.return_local();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let epilogue = func.epilogue();
        let b = func.block_mut(entry);
        // x is never read directly, but its address escapes.
        b.push(Instruction::Assignment { dest: x, source: imm(5) });
        b.push(Instruction::AddressOf { dest: p, source: Addressable::Local(x) });
        b.push(Instruction::PointerRead { dest: ret, address: RValue::Local(p) });
        b.terminate(Terminator::Jump { target: epilogue });

        run(&mut func);
        assert_eq!(func.block(entry).instructions.len(), 3);
    }
}
