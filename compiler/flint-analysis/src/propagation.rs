//! Forwards global value propagation. For every block this computes a map
//! `Local -> Option<RValue>` at entry and exit, where `Some(v)` means the
//! local is provably equal to `v` on every path into that point and `None`
//! means the local is known to vary. The meet at a join keeps only entries
//! on which every incoming path agrees; any disagreement degrades the entry
//! to `None`.
//!
//! The in-block substitution pass ([§local propagation][crate]) starts each
//! block from the entry map computed here rather than from scratch, which
//! is what lets copies propagate across block boundaries.

use flint_ir::{BlockId, Function, Instruction, LocalId, RValue};
use index_vec::IndexVec;
use indexmap::IndexMap;

use crate::pointed::PointedLocals;

/// `Some(v)`: provably equal to `v`. `None`: known to be varying.
pub type ValueMap = IndexMap<LocalId, Option<RValue>>;

#[derive(Debug, Default, Clone)]
pub struct BlockValues {
    pub input: ValueMap,
    pub output: ValueMap,
}

/// Run the propagation worklist to its fixed point.
pub fn global_value_propagation(
    func: &Function,
    pointed: &PointedLocals,
) -> IndexVec<BlockId, BlockValues> {
    let mut values: IndexVec<BlockId, BlockValues> =
        (0..func.block_count()).map(|_| BlockValues::default()).collect::<Vec<_>>().into();

    // Seed with every block, reverse layout order, so the stack pops the
    // prologue first and fall-through chains are visited early.
    let mut to_visit: Vec<BlockId> = func.layout().collect();
    to_visit.reverse();

    while let Some(current) = to_visit.pop() {
        let mut working = values[current].input.clone();

        for instruction in &func.block(current).instructions {
            transfer(&mut working, instruction, pointed);
        }

        if working != values[current].output {
            values[current].output = working;

            if let Some(terminator) = &func.block(current).terminator {
                for successor in terminator.successors() {
                    let output = values[current].output.clone();
                    if merge_into(&mut values[successor].input, &output) {
                        to_visit.push(successor);
                    }
                }
            }
        }
    }

    values
}

/// Apply one instruction to the working map. Only plain assignments
/// produce a known value; every other write degrades its destination.
fn transfer(working: &mut ValueMap, instruction: &Instruction, pointed: &PointedLocals) {
    match instruction {
        Instruction::Nop | Instruction::PointerWrite { .. } => {}
        Instruction::Assignment { dest, source } => {
            invalidate_copies_of(working, dest.id);

            let source_pointed = source
                .as_local()
                .map(|local| pointed.contains(&local.id))
                .unwrap_or(false);
            if pointed.contains(&dest.id) || source_pointed {
                working.insert(dest.id, None);
            } else {
                working.insert(dest.id, Some(*source));
            }
        }
        Instruction::BinaryOp { dest, .. }
        | Instruction::UnaryOp { dest, .. }
        | Instruction::Cast { dest, .. }
        | Instruction::Call { dest, .. }
        | Instruction::PointerRead { dest, .. }
        | Instruction::AddressOf { dest, .. } => {
            invalidate_copies_of(working, dest.id);
            working.insert(dest.id, None);
        }
    }
}

/// A write to `dest` makes every entry holding a copy of `dest` stale;
/// those entries degrade to varying.
fn invalidate_copies_of(working: &mut ValueMap, dest: LocalId) {
    for (_, value) in working.iter_mut() {
        if matches!(value, Some(RValue::Local(local)) if local.id == dest) {
            *value = None;
        }
    }
}

/// Merge a predecessor's output into a block's input. Returns true when
/// the input changed. Entries the input has never seen are adopted;
/// disagreeing entries degrade to `None`.
fn merge_into(input: &mut ValueMap, output: &ValueMap) -> bool {
    let mut changed = false;

    for (&local, value) in output {
        match input.entry(local) {
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(*value);
                changed = true;
            }
            indexmap::map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if *existing != *value && existing.is_some() {
                    *existing = None;
                    changed = true;
                }
            }
        }
    }

    changed
}
