//! Pretty-printing of the IR in a human readable format. Each function is
//! printed with its local declarations first, followed by every block in
//! layout order.

use std::fmt;

use crate::ir::{Addressable, Function, Immediate, Instruction, Local, RValue, Terminator};
use crate::write::{ForFormatting, WriteIr};

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.id.index())
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.read())
    }
}

impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RValue::Local(local) => write!(f, "{local}"),
            RValue::Immediate(imm) => write!(f, "{imm}"),
        }
    }
}

impl WriteIr for &Instruction {}

impl fmt::Display for ForFormatting<'_, &Instruction> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Instruction::Nop => write!(f, "nop"),
            Instruction::BinaryOp { dest, left, right, op } => {
                write!(f, "{dest} := {left} {} {right}", op.symbol())
            }
            Instruction::UnaryOp { dest, operand, op } => {
                write!(f, "{dest} := {}{operand}", op.symbol())
            }
            Instruction::Assignment { dest, source } => write!(f, "{dest} := {source}"),
            Instruction::Cast { dest, source } => {
                write!(f, "{dest} := cast<{}> {source}", dest.ty)
            }
            Instruction::Call { dest, name, args, .. } => {
                write!(f, "{dest} := {name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Instruction::PointerRead { dest, address } => write!(f, "{dest} := *{address}"),
            Instruction::PointerWrite { address, source } => write!(f, "*{address} := {source}"),
            Instruction::AddressOf { dest, source } => match source {
                Addressable::Local(local) => write!(f, "{dest} := &{local}"),
                Addressable::Literal(id) => write!(f, "{dest} := &literal.{}", id.index()),
            },
        }
    }
}

impl WriteIr for &Terminator {}

impl fmt::Display for ForFormatting<'_, &Terminator> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Terminator::Jump { target } => {
                write!(f, "jump {}", self.func.block(*target).label())
            }
            Terminator::ConditionalJump { condition, on_true, on_false } => write!(
                f,
                "jump if {condition} then {} else {}",
                self.func.block(*on_true).label(),
                self.func.block(*on_false).label()
            ),
        }
    }
}

impl WriteIr for &Function {}

impl fmt::Display for ForFormatting<'_, &Function> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.item;
        writeln!(f, "fn {}({} args) {{", func.name(), func.arg_count())?;

        for (id, info) in func.locals.iter_enumerated() {
            match &info.name {
                Some(name) => writeln!(f, "    _{}: {} => {}", id.index(), info.ty, name)?,
                None => writeln!(f, "    _{}: {}", id.index(), info.ty)?,
            }
        }

        for block in func.layout() {
            let data = func.block(block);
            writeln!(f, "  {}:", data.label())?;
            for instruction in &data.instructions {
                writeln!(f, "    {}", instruction.for_fmt(func))?;
            }
            if let Some(terminator) = &data.terminator {
                writeln!(f, "    {}", terminator.for_fmt(func))?;
            }
        }

        write!(f, "}}")
    }
}
