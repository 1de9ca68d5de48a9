//! Two-step-assignment elimination. Recognises the pattern "compute into
//! `t`, then copy `t` into `x`" where `t` dies at the copy, and rewrites
//! the producing instruction to write `x` directly, deleting the copy.
//! This is copy coalescing at the IR level.
//!
//! Scanning runs backwards through each block. A copy `x := t` whose
//! source is dead afterwards records the candidate `t -> (x, copy slot)`;
//! a later-encountered (earlier in program order) definition of `t` claims
//! the candidate. Any intervening use of `t` cancels it, as does any use
//! or redefinition of `x`, which would otherwise observe or clobber the
//! forwarded value.

use flint_analysis::{BlockLivenessMap, LiveSet, PointedLocals};
use flint_ir::{Function, Instruction, Local, LocalId, RValue, Terminator};
use indexmap::IndexMap;

pub struct TwoStepAssignmentElimination {
    working: LiveSet,
    candidates: IndexMap<LocalId, (Local, usize)>,
    changed: bool,
}

impl TwoStepAssignmentElimination {
    pub fn run(func: &mut Function, live: &BlockLivenessMap, pointed: &PointedLocals) -> bool {
        let mut pass =
            Self { working: LiveSet::new(), candidates: IndexMap::new(), changed: false };

        let layout: Vec<_> = func.layout().collect();
        for block in layout {
            pass.working = live[block].output.clone();
            pass.candidates.clear();

            if let Some(Terminator::ConditionalJump { condition: RValue::Local(local), .. }) =
                &func.block(block).terminator
            {
                pass.used(local.id);
            }

            for index in (0..func.block(block).instructions.len()).rev() {
                pass.visit(func, block, index, pointed);
            }

            func.block_mut(block).compact();
        }

        pass.changed
    }

    fn visit(
        &mut self,
        func: &mut Function,
        block: flint_ir::BlockId,
        index: usize,
        pointed: &PointedLocals,
    ) {
        // Copies with a dying, unaddressed source are the candidates.
        if let Instruction::Assignment { source: RValue::Local(source), .. } =
            func.block(block).instructions[index]
        {
            let is_target =
                !self.working.contains(&source.id) && !pointed.contains(&source.id);

            let dest = self.assigned(func, block, index);
            self.used(source.id);
            if is_target {
                // `dest` is re-read after `assigned`, so a chain of copies
                // forwards through to the outermost destination.
                self.candidates.insert(source.id, (dest, index));
            }
            return;
        }

        let uses: Vec<LocalId> = {
            let mut uses = Vec::new();
            let mut operand = |rvalue: &RValue| {
                if let RValue::Local(local) = rvalue {
                    uses.push(local.id);
                }
            };
            match &func.block(block).instructions[index] {
                Instruction::Nop | Instruction::Assignment { .. } => {}
                Instruction::BinaryOp { left, right, .. } => {
                    operand(left);
                    operand(right);
                }
                Instruction::UnaryOp { operand: value, .. } => operand(value),
                Instruction::Cast { source, .. } => operand(source),
                Instruction::Call { args, .. } => {
                    for arg in args {
                        operand(arg);
                    }
                }
                Instruction::PointerRead { address, .. } => operand(address),
                Instruction::PointerWrite { address, source } => {
                    operand(address);
                    operand(source);
                }
                Instruction::AddressOf { source, .. } => {
                    if let flint_ir::Addressable::Local(local) = source {
                        operand(&RValue::Local(*local));
                    }
                }
            }
            uses
        };

        if func.block(block).instructions[index].destination().is_some() {
            self.assigned(func, block, index);
        }
        for local in uses {
            self.used(local);
        }
    }

    /// Apply the definition of the instruction at `index`. When its
    /// destination is a recorded candidate, the destination is rewritten
    /// to the copy's target and the copy slot is tombstoned. Returns the
    /// (possibly rewritten) destination.
    fn assigned(&mut self, func: &mut Function, block: flint_ir::BlockId, index: usize) -> Local {
        let dest = func.block(block).instructions[index].destination().unwrap();
        self.working.shift_remove(&dest.id);

        // A redefinition of a candidate's target clobbers the value the
        // forwarded producer would write; drop such candidates.
        self.candidates.retain(|_, (target, _)| target.id != dest.id);

        if let Some((target, copy_index)) = self.candidates.shift_remove(&dest.id) {
            *func.block_mut(block).instructions[index].destination_mut().unwrap() = target;
            func.block_mut(block).instructions[copy_index] = Instruction::Nop;
            self.changed = true;
            return target;
        }

        dest
    }

    fn used(&mut self, local: LocalId) {
        self.working.insert(local);
        self.candidates.shift_remove(&local);
        // Reading a candidate's target between the producer and the copy
        // would observe the forwarded write early.
        self.candidates.retain(|_, (target, _)| target.id != local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_analysis::{pointed_locals, predecessor_map, LivenessAnalysis};
    use flint_ir::{BinOp, Immediate, TyId};

    fn imm(value: i64) -> RValue {
        RValue::Immediate(Immediate::new(value, TyId::INT))
    }

    fn run(func: &mut Function) -> bool {
        let preds = predecessor_map(func);
        let live = LivenessAnalysis::new(func, &preds).compute();
        let pointed = pointed_locals(func);
        TwoStepAssignmentElimination::run(func, &live, &pointed)
    }

    #[test]
    fn the_copy_is_folded_into_the_producer() {
        // t := a + b; x := t  ==>  x := a + b
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let a = func.new_local(TyId::INT);
        let b = func.new_local(TyId::INT);
        let t = func.new_local(TyId::INT);
        let ret = func.return_local();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let blk = func.block_mut(entry);
        blk.push(Instruction::Assignment { dest: a, source: imm(1) });
        blk.push(Instruction::Assignment { dest: b, source: imm(2) });
        blk.push(Instruction::BinaryOp {
            dest: t,
            left: RValue::Local(a),
            right: RValue::Local(b),
            op: BinOp::Add,
        });
        blk.push(Instruction::Assignment { dest: ret, source: RValue::Local(t) });
        blk.terminate(Terminator::Jump { target: epilogue });

        assert!(run(&mut func));
        let instructions = &func.block(entry).instructions;
        assert_eq!(instructions.len(), 3);
        assert_eq!(
            instructions[2],
            Instruction::BinaryOp {
                dest: ret,
                left: RValue::Local(a),
                right: RValue::Local(b),
                op: BinOp::Add,
            }
        );
    }

    #[test]
    fn a_use_between_producer_and_copy_cancels() {
        // t := a + b; c := t + 1; x := t  -- t is live at the copy, no rewrite.
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let a = func.new_local(TyId::INT);
        let b = func.new_local(TyId::INT);
        let t = func.new_local(TyId::INT);
        let c = func.new_local(TyId::INT);
        let ret = func.return_local();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let blk = func.block_mut(entry);
        blk.push(Instruction::BinaryOp {
            dest: t,
            left: RValue::Local(a),
            right: RValue::Local(b),
            op: BinOp::Add,
        });
        blk.push(Instruction::BinaryOp {
            dest: c,
            left: RValue::Local(t),
            right: imm(1),
            op: BinOp::Add,
        });
        blk.push(Instruction::Assignment { dest: ret, source: RValue::Local(t) });
        // Keep c alive so it is not DCE-irrelevant here.
        blk.push(Instruction::PointerWrite { address: RValue::Local(a), source: RValue::Local(c) });
        blk.terminate(Terminator::Jump { target: epilogue });

        let before = func.block(entry).instructions.clone();
        run(&mut func);
        assert_eq!(func.block(entry).instructions, before);
    }

    #[test]
    fn call_destinations_are_rewritten_too() {
        // t := f(); x := t  ==>  x := f()
        let mut func = Function::new("g", TyId::INT);
        let entry = func.new_block();
        let t = func.new_local(TyId::INT);
        let ret = func.return_local();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let blk = func.block_mut(entry);
        blk.push(Instruction::Call {
            dest: t,
            name: "f".to_string(),
            args: vec![],
            variadic: false,
        });
        blk.push(Instruction::Assignment { dest: ret, source: RValue::Local(t) });
        blk.terminate(Terminator::Jump { target: epilogue });

        assert!(run(&mut func));
        let instructions = &func.block(entry).instructions;
        assert_eq!(instructions.len(), 1);
        assert!(
            matches!(&instructions[0], Instruction::Call { dest, .. } if dest.id == ret.id)
        );
    }
}
