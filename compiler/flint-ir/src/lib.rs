//! Flint compiler intermediate representation (IR). A [ir::Function] is a
//! control-flow graph of [ir::BasicBlock]s, each a straight-line sequence
//! of [ir::Instruction]s ending in a single [ir::Terminator]. The front-end
//! lowers the parsed source into this form; every analysis, optimisation
//! and the x86-64 emitter operate on it.
pub mod ir;
pub mod ty;
pub mod visitor;
pub mod write;

pub use ir::{
    Addressable, BasicBlock, BinOp, BlockId, Function, Immediate, Instruction, Local, LocalId,
    LocalInfo, Module, RValue, StringId, Terminator, UnOp,
};
pub use ty::TyId;
