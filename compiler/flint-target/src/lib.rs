//! Target information for the Flint compiler. The only supported target
//! is x86-64 System V, so this crate is small: the register model that
//! the register allocator and the assembly emitter share, and utilities
//! for working with operand widths.
pub mod registers;
pub mod size;

pub use registers::{Reg, ALLOCATABLE, ARGUMENT_REGISTERS, CALLEE_SAVED, CALLER_SAVED};
pub use size::Size;
