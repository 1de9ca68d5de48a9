//! The block dependence map: for every block, the list of blocks whose
//! terminator can transfer control to it. A conditional jump whose branches
//! coincide contributes the predecessor twice; the liveness worklist is
//! insensitive to the duplicate.

use flint_ir::{BlockId, Function};
use index_vec::IndexVec;

/// `preds[b]` lists the predecessors of block `b`. Indexed by the owning
/// function's block arena, so dropped blocks simply have no entries.
pub type Predecessors = IndexVec<BlockId, Vec<BlockId>>;

/// Compute the predecessor map of `func` by inspecting every terminator in
/// the current layout.
pub fn predecessor_map(func: &Function) -> Predecessors {
    let mut preds: Predecessors =
        (0..func.block_count()).map(|_| Vec::new()).collect::<Vec<_>>().into();

    for block in func.layout() {
        if let Some(terminator) = &func.block(block).terminator {
            for successor in terminator.successors() {
                preds[successor].push(block);
            }
        }
    }

    preds
}
