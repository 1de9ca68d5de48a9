//! Constant folding. Binary and unary operations on immediates are
//! evaluated at the operand width (two's complement) and rewritten into
//! plain assignments; one-sided algebraic identities simplify mixed
//! operand forms; same-width casts collapse into assignments; and a
//! conditional jump on an immediate condition becomes an unconditional
//! jump to the taken branch.

use flint_ir::{
    BinOp, Function, Immediate, Instruction, RValue, Terminator, TyId, UnOp,
};

pub struct ConstantFolding {
    changed: bool,
}

impl ConstantFolding {
    pub fn run(func: &mut Function) -> bool {
        let mut pass = Self { changed: false };

        let layout: Vec<_> = func.layout().collect();
        for block in layout {
            let data = func.block_mut(block);
            for instruction in data.instructions.iter_mut() {
                pass.fold_instruction(instruction);
            }
            if let Some(terminator) = &mut data.terminator {
                pass.fold_terminator(terminator);
            }
        }

        pass.changed
    }

    fn fold_instruction(&mut self, instruction: &mut Instruction) {
        match instruction {
            Instruction::BinaryOp { dest, left, right, op } => {
                if let (Some(l), Some(r)) = (left.as_immediate(), right.as_immediate()) {
                    if let Some(folded) = evaluate_binary(*op, l, r, dest.ty) {
                        *instruction = Instruction::Assignment {
                            dest: *dest,
                            source: RValue::Immediate(folded),
                        };
                        self.changed = true;
                    }
                } else if let Some(rewritten) = apply_identity(*op, *dest, left, right) {
                    *instruction = rewritten;
                    self.changed = true;
                }
            }
            Instruction::UnaryOp { dest, operand, op } => {
                if let Some(imm) = operand.as_immediate() {
                    let width = imm.ty.size();
                    let value = match op {
                        UnOp::Neg => width.read_signed(imm.read().wrapping_neg()),
                        UnOp::LogNot => (imm.read() == 0) as i64,
                    };
                    *instruction = Instruction::Assignment {
                        dest: *dest,
                        source: RValue::Immediate(Immediate::new(value, dest.ty)),
                    };
                    self.changed = true;
                }
            }
            Instruction::Cast { dest, source } => {
                if source.ty().size() == dest.ty.size() {
                    // A type-only change; the bits are untouched.
                    *instruction = Instruction::Assignment { dest: *dest, source: *source };
                    self.changed = true;
                } else if let Some(imm) = source.as_immediate() {
                    let value = dest.ty.size().read_signed(imm.read());
                    *instruction = Instruction::Assignment {
                        dest: *dest,
                        source: RValue::Immediate(Immediate::new(value, dest.ty)),
                    };
                    self.changed = true;
                }
            }
            _ => {}
        }
    }

    fn fold_terminator(&mut self, terminator: &mut Terminator) {
        if let Terminator::ConditionalJump { condition, on_true, on_false } = terminator {
            if let Some(imm) = condition.as_immediate() {
                let target = if imm.read() != 0 { *on_true } else { *on_false };
                *terminator = Terminator::Jump { target };
                self.changed = true;
            }
        }
    }
}

/// Evaluate `left op right` at the operand width. Division by zero is left
/// in place for the hardware to trap on.
fn evaluate_binary(op: BinOp, left: Immediate, right: Immediate, dest_ty: TyId) -> Option<Immediate> {
    let width = left.ty.size();
    let a = left.read();
    let b = right.read();

    let raw = match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div if b == 0 => return None,
        BinOp::Div => a.wrapping_div(b),
        BinOp::Mod if b == 0 => return None,
        BinOp::Mod => a.wrapping_rem(b),
        BinOp::Eq => (a == b) as i64,
        BinOp::Neq => (a != b) as i64,
        BinOp::Lt => (a < b) as i64,
        BinOp::Gt => (a > b) as i64,
        BinOp::Le => (a <= b) as i64,
        BinOp::Ge => (a >= b) as i64,
        BinOp::And => a & b,
        BinOp::Xor => a ^ b,
        BinOp::Or => a | b,
    };

    let value = if op.is_comparison() { raw } else { width.read_signed(raw) };
    Some(Immediate::new(value, dest_ty))
}

/// Simplify `x + 0`, `0 - x`, `x * 1`, `x * 0` and friends when exactly
/// one operand is constant.
fn apply_identity(
    op: BinOp,
    dest: flint_ir::Local,
    left: &RValue,
    right: &RValue,
) -> Option<Instruction> {
    let left_value = left.as_immediate().map(|imm| imm.read());
    let right_value = right.as_immediate().map(|imm| imm.read());

    match op {
        BinOp::Add => match (left_value, right_value) {
            (Some(0), _) => Some(Instruction::Assignment { dest, source: *right }),
            (_, Some(0)) => Some(Instruction::Assignment { dest, source: *left }),
            _ => None,
        },
        BinOp::Sub => match (left_value, right_value) {
            (_, Some(0)) => Some(Instruction::Assignment { dest, source: *left }),
            (Some(0), _) => {
                Some(Instruction::UnaryOp { dest, operand: *right, op: UnOp::Neg })
            }
            _ => None,
        },
        BinOp::Mul => match (left_value, right_value) {
            (Some(0), _) | (_, Some(0)) => Some(Instruction::Assignment {
                dest,
                source: RValue::Immediate(Immediate::new(0, dest.ty)),
            }),
            (Some(1), _) => Some(Instruction::Assignment { dest, source: *right }),
            (_, Some(1)) => Some(Instruction::Assignment { dest, source: *left }),
            _ => None,
        },
        _ => None,
    }
}
