//! IR writing utilities: a human-readable pretty printer and a `graphviz`
//! writer for the control-flow graph. Instructions and terminators need
//! their owning [Function] to resolve block labels, so both writers go
//! through the [ForFormatting] wrapper rather than plain [std::fmt::Display]
//! implementations.

pub mod graphviz;
pub mod pretty;

use crate::ir::Function;

/// Pairs an IR item with the [Function] that owns it for formatting.
pub struct ForFormatting<'ir, T> {
    /// The item that is being printed.
    pub item: T,

    /// The function used to resolve labels and local names.
    pub func: &'ir Function,
}

pub trait WriteIr: Sized {
    fn for_fmt(self, func: &Function) -> ForFormatting<'_, Self> {
        ForFormatting { item: self, func }
    }
}
