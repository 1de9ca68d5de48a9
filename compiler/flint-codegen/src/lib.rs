//! The Flint back-end: graph-colouring register allocation over the
//! interference graph, and the x86-64 System V assembly emitter that
//! consumes the IR together with the allocation decision.
pub mod allocation;
pub mod peephole;
pub mod x86;

pub use allocation::{compute_register_allocation, ColorId, RegisterAllocation};
pub use x86::X86Emitter;
