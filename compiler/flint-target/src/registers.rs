//! The x86-64 System V register model. The register allocator hands out
//! colours over [ALLOCATABLE]; the emitter maps colours back to [Reg]s and
//! consults the preservation classes when spilling around calls.

use std::fmt;

use crate::Size;

/// A general-purpose x86-64 register, named by its 64-bit form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    Rbp,
    Rsp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

/// Registers the callee may clobber freely.
pub const CALLER_SAVED: [Reg; 9] =
    [Reg::Rax, Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9, Reg::R10, Reg::R11];

/// Registers the callee must preserve.
pub const CALLEE_SAVED: [Reg; 6] = [Reg::Rbx, Reg::Rbp, Reg::R12, Reg::R13, Reg::R14, Reg::R15];

/// The registers the allocator may hand out, in colour order. `rax` and
/// `rdx` are reserved for `idiv` and scratch moves, `rcx` for immediate
/// divisors and alignment filler, and the argument registers for calls.
pub const ALLOCATABLE: [Reg; 7] =
    [Reg::R10, Reg::R11, Reg::Rbx, Reg::R12, Reg::R13, Reg::R14, Reg::R15];

/// Integer argument registers, in declaration order.
pub const ARGUMENT_REGISTERS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

impl Reg {
    /// Whether the callee must preserve this register.
    pub fn is_callee_saved(self) -> bool {
        CALLEE_SAVED.contains(&self)
    }

    /// Whether a call may clobber this register.
    pub fn is_caller_saved(self) -> bool {
        CALLER_SAVED.contains(&self)
    }

    /// The name of this register at the given operand width, without the
    /// `%` sigil: `Reg::Rax.name(Size::from_bytes(4))` is `"eax"`.
    pub fn name(self, size: Size) -> &'static str {
        let names: [&'static str; 4] = match self {
            Reg::Rax => ["al", "ax", "eax", "rax"],
            Reg::Rbx => ["bl", "bx", "ebx", "rbx"],
            Reg::Rcx => ["cl", "cx", "ecx", "rcx"],
            Reg::Rdx => ["dl", "dx", "edx", "rdx"],
            Reg::Rsi => ["sil", "si", "esi", "rsi"],
            Reg::Rdi => ["dil", "di", "edi", "rdi"],
            Reg::Rbp => ["bpl", "bp", "ebp", "rbp"],
            Reg::Rsp => ["spl", "sp", "esp", "rsp"],
            Reg::R8 => ["r8b", "r8w", "r8d", "r8"],
            Reg::R9 => ["r9b", "r9w", "r9d", "r9"],
            Reg::R10 => ["r10b", "r10w", "r10d", "r10"],
            Reg::R11 => ["r11b", "r11w", "r11d", "r11"],
            Reg::R12 => ["r12b", "r12w", "r12d", "r12"],
            Reg::R13 => ["r13b", "r13w", "r13d", "r13"],
            Reg::R14 => ["r14b", "r14w", "r14d", "r14"],
            Reg::R15 => ["r15b", "r15w", "r15d", "r15"],
        };

        match size.bytes() {
            1 => names[0],
            2 => names[1],
            4 => names[2],
            8 => names[3],
            width => panic!("unsupported operand width: {width} bytes"),
        }
    }

    /// The AT&T operand spelling at the given width, e.g. `%eax`.
    pub fn operand(self, size: Size) -> String {
        format!("%{}", self.name(size))
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name(Size::from_bytes(8)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preservation_classes_are_disjoint() {
        for reg in CALLER_SAVED {
            assert!(!reg.is_callee_saved(), "{reg} cannot be in both classes");
        }
    }

    #[test]
    fn allocatable_registers_never_clash_with_call_plumbing() {
        for reg in ALLOCATABLE {
            assert!(!ARGUMENT_REGISTERS.contains(&reg));
            assert!(!matches!(reg, Reg::Rax | Reg::Rdx | Reg::Rcx));
        }
    }

    #[test]
    fn sized_names() {
        assert_eq!(Reg::Rax.name(Size::from_bytes(4)), "eax");
        assert_eq!(Reg::R10.name(Size::from_bytes(1)), "r10b");
        assert_eq!(Reg::Rdi.operand(Size::from_bytes(8)), "%rdi");
    }
}
