//! Writes the control-flow graph of a function in the `graphviz` dot
//! format, one record-shaped node per basic block.

use std::io::{self, Write};

use crate::ir::{Function, Terminator};
use crate::write::WriteIr;

/// Write `func`'s control-flow graph to `out` as a `digraph`.
pub fn write_graph(out: &mut impl Write, func: &Function) -> io::Result<()> {
    writeln!(out, "digraph \"{}\" {{", func.name())?;
    writeln!(out, "    node [shape=box, fontname=monospace];")?;

    for block in func.layout() {
        let data = func.block(block);
        let mut body = String::new();
        for instruction in &data.instructions {
            body.push_str(&escape(&format!("{}", instruction.for_fmt(func))));
            body.push_str("\\l");
        }
        writeln!(out, "    \"{}\" [label=\"{}\\l{}\"];", data.label(), data.label(), body)?;

        match &data.terminator {
            Some(Terminator::Jump { target }) => {
                writeln!(out, "    \"{}\" -> \"{}\";", data.label(), func.block(*target).label())?;
            }
            Some(Terminator::ConditionalJump { on_true, on_false, .. }) => {
                writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [label=\"true\"];",
                    data.label(),
                    func.block(*on_true).label()
                )?;
                writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [label=\"false\"];",
                    data.label(),
                    func.block(*on_false).label()
                )?;
            }
            None => {}
        }
    }

    writeln!(out, "}}")
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"").replace('<', "\\<").replace('>', "\\>")
}
