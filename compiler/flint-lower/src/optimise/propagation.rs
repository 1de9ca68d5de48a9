//! The in-block half of value propagation. The global analysis
//! ([flint_analysis::propagation]) computes, for every block, the values
//! that are known on entry along every path; this pass walks each block in
//! program order starting from that map, substitutes known operands, and
//! keeps the map current across assignments and other writes.

use flint_analysis::{global_value_propagation, pointed_locals, PointedLocals};
use flint_ir::{Function, Instruction, LocalId, RValue, Terminator};
use indexmap::IndexMap;

pub struct ValuePropagation {
    known: IndexMap<LocalId, RValue>,
    pointed: PointedLocals,
    changed: bool,
}

impl ValuePropagation {
    pub fn run(func: &mut Function, pointed: &PointedLocals) -> bool {
        let values = global_value_propagation(func, pointed);

        let mut pass =
            Self { known: IndexMap::new(), pointed: pointed.clone(), changed: false };

        let layout: Vec<_> = func.layout().collect();
        for block in layout {
            // Start from the join-compatible entry mapping, not from
            // scratch; this is what carries copies across block edges.
            pass.known = values[block]
                .input
                .iter()
                .filter_map(|(&local, value)| value.map(|value| (local, value)))
                .collect();

            let data = func.block_mut(block);
            for instruction in data.instructions.iter_mut() {
                pass.visit_instruction(instruction);
            }
            if let Some(Terminator::ConditionalJump { condition, .. }) = &mut data.terminator {
                pass.try_substitute(condition);
            }
        }

        pass.changed
    }

    fn visit_instruction(&mut self, instruction: &mut Instruction) {
        match instruction {
            Instruction::Nop => {}
            Instruction::BinaryOp { dest, left, right, .. } => {
                self.try_substitute(left);
                self.try_substitute(right);
                self.invalidate(dest.id);
            }
            Instruction::UnaryOp { dest, operand, .. } => {
                self.try_substitute(operand);
                self.invalidate(dest.id);
            }
            Instruction::Assignment { dest, source } => {
                self.try_substitute(source);
                self.set_substitution(*dest, *source);
            }
            Instruction::Cast { dest, source } => {
                self.try_substitute(source);
                self.invalidate(dest.id);
            }
            Instruction::Call { dest, args, .. } => {
                for arg in args {
                    self.try_substitute(arg);
                }
                self.invalidate(dest.id);
            }
            Instruction::PointerRead { dest, address } => {
                self.try_substitute(address);
                self.invalidate(dest.id);
            }
            Instruction::PointerWrite { address, source } => {
                self.try_substitute(address);
                self.try_substitute(source);
            }
            Instruction::AddressOf { dest, .. } => {
                self.invalidate(dest.id);
            }
        }
    }

    /// Replace a local operand with its known value. Replacing a value
    /// with itself is not a change, or the driver would never reach its
    /// fixed point.
    fn try_substitute(&mut self, rvalue: &mut RValue) {
        if let RValue::Local(local) = rvalue {
            if let Some(&known) = self.known.get(&local.id) {
                if known != *rvalue {
                    *rvalue = known;
                    self.changed = true;
                }
            }
        }
    }

    /// Record `dest := source`. Pointed locals can alias through memory, so
    /// neither side of a mapping may be one; a self-assignment records
    /// nothing.
    fn set_substitution(&mut self, dest: flint_ir::Local, source: RValue) {
        self.invalidate(dest.id);

        if source == RValue::Local(dest) {
            return;
        }
        let source_pointed =
            source.as_local().map(|local| self.pointed.contains(&local.id)).unwrap_or(false);
        if !self.pointed.contains(&dest.id) && !source_pointed {
            self.known.insert(dest.id, source);
        }
    }

    /// A write to `dest` drops its mapping and every mapping whose value is
    /// a stale copy of `dest`.
    fn invalidate(&mut self, dest: LocalId) {
        self.known.shift_remove(&dest);
        self.known.retain(|_, value| {
            !matches!(value, RValue::Local(local) if local.id == dest)
        });
    }
}

/// Convenience entry point used by the optimiser driver.
pub fn propagate_values(func: &mut Function) -> bool {
    let pointed = pointed_locals(func);
    ValuePropagation::run(func, &pointed)
}
