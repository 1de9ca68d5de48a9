//! Dataflow analyses over the Flint IR: the block predecessor map, the
//! pointed-local gatherer, backwards block liveness (optionally building
//! the interference graph and per-call live sets as side outputs), and the
//! forwards global value propagation that feeds the in-block substitution
//! pass.
pub mod dependence;
pub mod interference;
pub mod liveness;
pub mod pointed;
pub mod propagation;

pub use dependence::{predecessor_map, Predecessors};
pub use interference::InterferenceGraph;
pub use liveness::{BlockLiveness, BlockLivenessMap, CallLiveness, LiveSet, LivenessAnalysis};
pub use pointed::{pointed_locals, PointedLocals};
pub use propagation::{global_value_propagation, BlockValues, ValueMap};
