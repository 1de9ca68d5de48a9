//! Utilities to traverse the IR. The default traversal walks a function's
//! prologue, its body blocks in layout order, then its epilogue; within a
//! block it walks the instructions in order and the terminator last.
//! Analyses override the hooks they care about and pattern-match on the
//! instruction variants they need; everything else is a no-op.

use crate::ir::{BlockId, Function, Instruction, Terminator};

pub trait IrVisitor: Sized {
    fn visit_function(&mut self, func: &Function) {
        walk_function(self, func);
    }

    fn visit_block(&mut self, func: &Function, block: BlockId) {
        walk_block(self, func, block);
    }

    fn visit_instruction(&mut self, _instruction: &Instruction) {}

    fn visit_terminator(&mut self, _terminator: &Terminator) {}
}

pub fn walk_function<V: IrVisitor>(visitor: &mut V, func: &Function) {
    for block in func.layout() {
        visitor.visit_block(func, block);
    }
}

pub fn walk_block<V: IrVisitor>(visitor: &mut V, func: &Function, block: BlockId) {
    let data = func.block(block);
    for instruction in &data.instructions {
        visitor.visit_instruction(instruction);
    }
    if let Some(terminator) = &data.terminator {
        visitor.visit_terminator(terminator);
    }
}
