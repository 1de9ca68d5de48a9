//! The x86-64 System V assembly emitter. One [X86Emitter] is built per
//! function from the IR, the register-allocation result and the liveness
//! information; it produces a list of [AsmLine]s that the peephole
//! cleanup then simplifies before rendering.
//!
//! Instruction selection notes:
//! - commutative binary operations prefer the destination's register as
//!   the accumulator and pick whichever operand already sits there;
//! - a comparison that feeds the block's own conditional jump (and whose
//!   result is dead afterwards) emits no `set<cc>`: the condition code is
//!   carried into the terminator and becomes a direct `j<cc>`;
//! - `idiv` keeps `rax`/`rdx` reserved, `rcx` holds immediate divisors;
//! - pointer traffic goes through the `rdx` scratch register;
//! - every call keeps `%rsp` 16-byte aligned, pushing an alignment filler
//!   before any stack-passed arguments when the running push counter
//!   would leave the boundary misaligned.

use std::io::{self, Write};

use flint_analysis::{BlockLivenessMap, CallLiveness};
use flint_ir::{
    Addressable, BinOp, BlockId, Function, Instruction, Local, LocalId, RValue, Terminator, TyId,
    UnOp,
};
use flint_target::{Reg, Size, ALLOCATABLE, ARGUMENT_REGISTERS};
use indexmap::IndexMap;
use log::trace;

use crate::allocation::RegisterAllocation;

/// A single line of output: a label, a jump (kept structured so the
/// peephole pass can reason about control flow), or any other instruction
/// or directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmLine {
    Label(String),
    Jump(String),
    CondJump(&'static str, String),
    Inst { op: String, args: String },
}

/// Render `lines` in GNU assembler syntax.
pub fn render(lines: &[AsmLine], out: &mut impl Write) -> io::Result<()> {
    for line in lines {
        match line {
            AsmLine::Label(label) => writeln!(out, "{label}:")?,
            AsmLine::Jump(target) => writeln!(out, "    {:<7} {target}", "jmp")?,
            AsmLine::CondJump(cc, target) => {
                writeln!(out, "    {:<7} {target}", format!("j{cc}"))?;
            }
            AsmLine::Inst { op, args } if args.is_empty() => writeln!(out, "    {op}")?,
            AsmLine::Inst { op, args } => writeln!(out, "    {op:<7} {args}")?,
        }
    }
    Ok(())
}

/// Where a local lives: a machine register or a stack slot at a negative
/// offset from `%rbp`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Loc {
    Reg(Reg),
    Stack(u32),
}

pub struct X86Emitter<'a> {
    func: &'a Function,
    allocation: &'a RegisterAllocation,
    live: &'a BlockLivenessMap,
    calls: &'a CallLiveness,

    lines: Vec<AsmLine>,
    /// 8-byte words pushed since function entry; the call emitter keeps
    /// `stack_words + 1` (the return address) even at every `call`.
    stack_words: u32,
    /// The condition code of a comparison fused into the terminator.
    deferred: Option<(LocalId, &'static str)>,
    spill_slots: IndexMap<LocalId, u32>,
    used_callee_saved: Vec<Reg>,
    has_frame: bool,
}

impl<'a> X86Emitter<'a> {
    pub fn new(
        func: &'a Function,
        allocation: &'a RegisterAllocation,
        live: &'a BlockLivenessMap,
        calls: &'a CallLiveness,
    ) -> Self {
        let spill_slots: IndexMap<LocalId, u32> = allocation
            .spilled
            .iter()
            .enumerate()
            .map(|(index, &local)| (local, 8 * (index as u32 + 1)))
            .collect();

        let used_callee_saved: Vec<Reg> = ALLOCATABLE
            .iter()
            .copied()
            .filter(|reg| {
                reg.is_callee_saved()
                    && allocation
                        .registers
                        .values()
                        .any(|&color| ALLOCATABLE[color as usize] == *reg)
            })
            .collect();

        let has_frame = !spill_slots.is_empty();

        Self {
            func,
            allocation,
            live,
            calls,
            lines: Vec::new(),
            stack_words: 0,
            deferred: None,
            spill_slots,
            used_callee_saved,
            has_frame,
        }
    }

    /// Emit the whole function: directives, frame setup, every block in
    /// layout order, the return sequence, and the string-literal section.
    pub fn emit(mut self) -> Vec<AsmLine> {
        self.inst(".section", ".text");
        self.inst(".global", self.func.name().to_string());
        self.lines.push(AsmLine::Label(self.func.name().to_string()));

        self.emit_frame_setup();
        self.emit_incoming_arguments();

        for block in self.func.layout() {
            if block == self.func.epilogue() {
                break;
            }
            self.emit_block(block);
        }

        self.emit_epilogue();
        self.emit_literals();
        self.lines
    }

    // ---------------------------------------------------------------- //
    // Prologue and epilogue

    fn emit_frame_setup(&mut self) {
        if self.has_frame {
            self.inst("pushq", "%rbp");
            self.stack_words += 1;
        }
        for reg in self.used_callee_saved.clone() {
            self.inst("pushq", reg.operand(Size::from_bytes(8)));
            self.stack_words += 1;
        }
        if self.has_frame {
            self.inst("movq", "%rsp, %rbp");
            let spill_bytes = 8 * self.spill_slots.len() as u32;
            self.inst("subq", format!("${spill_bytes}, %rsp"));
            self.stack_words += self.spill_slots.len() as u32;
        }
    }

    fn emit_incoming_arguments(&mut self) {
        let entry_live = &self.live[self.func.prologue()].input;

        for index in 1..=self.func.arg_count() {
            let local = self.func.param(index);
            if !entry_live.contains(&local.id) {
                // Dead on entry; its home never needs the value.
                continue;
            }

            let size = local.ty.size();
            if index <= ARGUMENT_REGISTERS.len() {
                let reg = ARGUMENT_REGISTERS[index - 1];
                self.move_reg_to_local(reg, local);
            } else {
                // Stack-passed: above the return address, adjusted for
                // everything pushed since entry.
                let offset = (self.stack_words + (index as u32 - 6)) * 8;
                self.inst(
                    format!("mov{}", size.suffix()),
                    format!("{offset}(%rsp), {}", Reg::Rax.operand(size)),
                );
                self.store_reg(Reg::Rax, local);
            }
        }
    }

    fn emit_epilogue(&mut self) {
        let epilogue = self.func.epilogue();
        self.lines.push(AsmLine::Label(self.func.block(epilogue).label().to_string()));

        let instructions = self.func.block(epilogue).instructions.clone();
        for (index, instruction) in instructions.iter().enumerate() {
            self.emit_instruction(epilogue, index, false, instruction);
        }

        let ret = self.func.return_local();
        if ret.ty != TyId::VOID {
            self.load(&RValue::Local(ret), Reg::Rax, ret.ty.size());
        }

        if self.has_frame {
            self.inst("movq", "%rbp, %rsp");
        }
        for reg in self.used_callee_saved.clone().into_iter().rev() {
            self.inst("popq", reg.operand(Size::from_bytes(8)));
        }
        if self.has_frame {
            self.inst("popq", "%rbp");
        }
        self.inst("ret", "");
    }

    fn emit_literals(&mut self) {
        if self.func.literals().is_empty() {
            return;
        }

        self.inst(".section", ".rodata");
        for (id, text) in self.func.literals().iter_enumerated() {
            let label = format!(".{}.literal.{}", self.func.name(), id.index());
            self.lines.push(AsmLine::Label(label));
            self.inst(".asciz", format!("\"{}\"", escape_asm_string(text)));
        }
    }

    // ---------------------------------------------------------------- //
    // Blocks

    fn emit_block(&mut self, block: BlockId) {
        trace!("emitting block {}", self.func.block(block).label());
        self.lines.push(AsmLine::Label(self.func.block(block).label().to_string()));
        self.deferred = None;

        let instructions = self.func.block(block).instructions.clone();
        let count = instructions.len();
        for (index, instruction) in instructions.iter().enumerate() {
            self.emit_instruction(block, index, index + 1 == count, instruction);
        }

        let terminator = self.func.block(block).terminator.clone();
        match terminator {
            Some(Terminator::Jump { target }) => {
                self.lines.push(AsmLine::Jump(self.block_label(target)));
            }
            Some(Terminator::ConditionalJump { condition, on_true, on_false }) => {
                self.emit_conditional_jump(&condition, on_true, on_false);
            }
            None => {}
        }
    }

    fn emit_conditional_jump(&mut self, condition: &RValue, on_true: BlockId, on_false: BlockId) {
        if let Some((local, cc)) = self.deferred.take() {
            debug_assert_eq!(Some(local), condition.as_local().map(|l| l.id));
            self.lines.push(AsmLine::CondJump(cc, self.block_label(on_true)));
            self.lines.push(AsmLine::Jump(self.block_label(on_false)));
            return;
        }

        let size = condition.ty().size();
        let suffix = size.suffix();
        match condition {
            RValue::Local(local) => match self.loc(*local) {
                Loc::Reg(reg) => {
                    let operand = reg.operand(size);
                    self.inst(format!("test{suffix}"), format!("{operand}, {operand}"));
                }
                Loc::Stack(_) => {
                    self.load(condition, Reg::Rax, size);
                    let operand = Reg::Rax.operand(size);
                    self.inst(format!("test{suffix}"), format!("{operand}, {operand}"));
                }
            },
            RValue::Immediate(_) => {
                self.load(condition, Reg::Rax, size);
                let operand = Reg::Rax.operand(size);
                self.inst(format!("test{suffix}"), format!("{operand}, {operand}"));
            }
        }

        self.lines.push(AsmLine::CondJump("ne", self.block_label(on_true)));
        self.lines.push(AsmLine::Jump(self.block_label(on_false)));
    }

    // ---------------------------------------------------------------- //
    // Instructions

    fn emit_instruction(
        &mut self,
        block: BlockId,
        index: usize,
        is_last: bool,
        instruction: &Instruction,
    ) {
        match instruction {
            Instruction::Nop => {}
            Instruction::BinaryOp { dest, left, right, op } => {
                if op.is_comparison() {
                    self.emit_comparison(block, is_last, *dest, left, right, *op);
                } else if matches!(op, BinOp::Div | BinOp::Mod) {
                    self.emit_division(*dest, left, right, *op);
                } else {
                    self.emit_arithmetic(*dest, left, right, *op);
                }
            }
            Instruction::UnaryOp { dest, operand, op } => match op {
                UnOp::Neg => self.emit_negation(*dest, operand),
                UnOp::LogNot => self.emit_logical_not(block, is_last, *dest, operand),
            },
            Instruction::Assignment { dest, source } => {
                self.move_rvalue_to_local(source, *dest);
            }
            Instruction::Cast { dest, source } => self.emit_cast(*dest, source),
            Instruction::Call { dest, name, args, variadic } => {
                self.emit_call(block, index, *dest, name, args, *variadic);
            }
            Instruction::PointerRead { dest, address } => {
                self.load(address, Reg::Rdx, Size::from_bytes(8));
                let size = dest.ty.size();
                match self.loc(*dest) {
                    Loc::Reg(reg) => {
                        self.inst(
                            format!("mov{}", size.suffix()),
                            format!("(%rdx), {}", reg.operand(size)),
                        );
                    }
                    Loc::Stack(_) => {
                        self.inst(
                            format!("mov{}", size.suffix()),
                            format!("(%rdx), {}", Reg::Rax.operand(size)),
                        );
                        self.store_reg(Reg::Rax, *dest);
                    }
                }
            }
            Instruction::PointerWrite { address, source } => {
                self.load(address, Reg::Rdx, Size::from_bytes(8));
                let size = source.ty().size();
                match source {
                    RValue::Immediate(imm) => {
                        self.inst(
                            format!("mov{}", size.suffix()),
                            format!("${}, (%rdx)", imm.read()),
                        );
                    }
                    RValue::Local(local) => match self.loc(*local) {
                        Loc::Reg(reg) => {
                            self.inst(
                                format!("mov{}", size.suffix()),
                                format!("{}, (%rdx)", reg.operand(size)),
                            );
                        }
                        Loc::Stack(_) => {
                            self.load(source, Reg::Rax, size);
                            self.inst(
                                format!("mov{}", size.suffix()),
                                format!("{}, (%rdx)", Reg::Rax.operand(size)),
                            );
                        }
                    },
                }
            }
            Instruction::AddressOf { dest, source } => {
                let location = match source {
                    Addressable::Local(local) => match self.loc(*local) {
                        Loc::Stack(offset) => format!("-{offset}(%rbp)"),
                        Loc::Reg(_) => {
                            unreachable!("address taken of a register-allocated local")
                        }
                    },
                    Addressable::Literal(id) => {
                        format!(".{}.literal.{}(%rip)", self.func.name(), id.index())
                    }
                };

                match self.loc(*dest) {
                    Loc::Reg(reg) => {
                        self.inst("leaq", format!("{location}, {}", reg.operand(Size::from_bytes(8))));
                    }
                    Loc::Stack(_) => {
                        self.inst("leaq", format!("{location}, %rax"));
                        self.store_reg(Reg::Rax, *dest);
                    }
                }
            }
        }
    }

    fn emit_arithmetic(&mut self, dest: Local, left: &RValue, right: &RValue, op: BinOp) {
        let size = dest.ty.size();
        let mnemonic = match op {
            BinOp::Add => format!("add{}", size.suffix()),
            BinOp::Sub => format!("sub{}", size.suffix()),
            BinOp::Mul => format!("imul{}", size.suffix()),
            BinOp::And => format!("and{}", size.suffix()),
            BinOp::Xor => format!("xor{}", size.suffix()),
            BinOp::Or => format!("or{}", size.suffix()),
            other => unreachable!("{other:?} is not handled here"),
        };

        if op.is_commutative() {
            if let Loc::Reg(reg) = self.loc(dest) {
                // Keep the accumulator in the destination register and
                // pick whichever operand is already there.
                let other = if self.local_in_reg(left, reg) {
                    right
                } else if self.local_in_reg(right, reg) {
                    left
                } else {
                    self.load(left, reg, size);
                    right
                };
                let operand = self.operand(other, size);
                self.inst(mnemonic, format!("{operand}, {}", reg.operand(size)));
                return;
            }
        } else if let Loc::Reg(reg) = self.loc(dest) {
            // Subtraction: safe as long as the subtrahend does not occupy
            // the destination register.
            if !self.local_in_reg(right, reg) {
                self.load(left, reg, size);
                let operand = self.operand(right, size);
                self.inst(mnemonic, format!("{operand}, {}", reg.operand(size)));
                return;
            }
        }

        // Generic path through the scratch accumulator.
        self.load(left, Reg::Rax, size);
        let operand = self.operand(right, size);
        self.inst(mnemonic, format!("{operand}, {}", Reg::Rax.operand(size)));
        self.store_reg(Reg::Rax, dest);
    }

    fn emit_division(&mut self, dest: Local, left: &RValue, right: &RValue, op: BinOp) {
        let size = dest.ty.size();
        debug_assert!(size.bytes() >= 4, "division operands are promoted to int");

        self.load(left, Reg::Rax, size);
        self.inst(if size.bytes() == 8 { "cqto" } else { "cltd" }, "");

        let divisor = match right {
            RValue::Immediate(_) => {
                self.load(right, Reg::Rcx, size);
                Reg::Rcx.operand(size)
            }
            RValue::Local(local) => match self.loc(*local) {
                Loc::Reg(reg) => reg.operand(size),
                Loc::Stack(offset) => format!("-{offset}(%rbp)"),
            },
        };
        self.inst(format!("idiv{}", size.suffix()), divisor);

        let result = if op == BinOp::Div { Reg::Rax } else { Reg::Rdx };
        self.move_reg_to_local(result, dest);
    }

    fn emit_comparison(
        &mut self,
        block: BlockId,
        is_last: bool,
        dest: Local,
        left: &RValue,
        right: &RValue,
        op: BinOp,
    ) {
        let size = left.ty().size();
        self.load(left, Reg::Rax, size);
        let operand = self.operand(right, size);
        self.inst(
            format!("cmp{}", size.suffix()),
            format!("{operand}, {}", Reg::Rax.operand(size)),
        );

        let cc = match op {
            BinOp::Eq => "e",
            BinOp::Neq => "ne",
            BinOp::Lt => "l",
            BinOp::Gt => "g",
            BinOp::Le => "le",
            BinOp::Ge => "ge",
            other => unreachable!("{other:?} is not a comparison"),
        };

        self.set_or_defer(block, is_last, dest, cc);
    }

    fn emit_logical_not(&mut self, block: BlockId, is_last: bool, dest: Local, operand: &RValue) {
        let size = operand.ty().size();
        self.load(operand, Reg::Rax, size);
        let reg = Reg::Rax.operand(size);
        self.inst(format!("test{}", size.suffix()), format!("{reg}, {reg}"));
        self.set_or_defer(block, is_last, dest, "e");
    }

    /// Either fuse the just-computed condition into the terminator (when
    /// this is the last instruction, the terminator branches on `dest`,
    /// and `dest` is dead after the block) or materialise it with
    /// `set<cc>`.
    fn set_or_defer(&mut self, block: BlockId, is_last: bool, dest: Local, cc: &'static str) {
        let fusable = is_last
            && matches!(
                &self.func.block(block).terminator,
                Some(Terminator::ConditionalJump { condition: RValue::Local(cond), .. })
                    if cond.id == dest.id
            )
            && !self.live[block].output.contains(&dest.id);

        if fusable {
            self.deferred = Some((dest.id, cc));
            return;
        }

        self.inst(format!("set{cc}"), "%al");
        let size = dest.ty.size();
        if size.bytes() == 1 {
            self.store_reg(Reg::Rax, dest);
        } else {
            let widen = if size.bytes() == 8 { "movzbq" } else { "movzbl" };
            self.inst(widen, format!("%al, {}", Reg::Rax.operand(size)));
            self.store_reg(Reg::Rax, dest);
        }
    }

    fn emit_negation(&mut self, dest: Local, operand: &RValue) {
        let size = dest.ty.size();
        match self.loc(dest) {
            Loc::Reg(reg) => {
                self.load(operand, reg, size);
                self.inst(format!("neg{}", size.suffix()), reg.operand(size));
            }
            Loc::Stack(_) => {
                self.load(operand, Reg::Rax, size);
                self.inst(format!("neg{}", size.suffix()), Reg::Rax.operand(size));
                self.store_reg(Reg::Rax, dest);
            }
        }
    }

    fn emit_cast(&mut self, dest: Local, source: &RValue) {
        let to = dest.ty.size();

        if let RValue::Immediate(imm) = source {
            let value = to.read_signed(imm.read());
            let source = RValue::Immediate(flint_ir::Immediate::new(value, dest.ty));
            self.move_rvalue_to_local(&source, dest);
            return;
        }

        let from = source.ty().size();
        if from.bytes() >= to.bytes() {
            // Narrowing (or same width): move the low bytes.
            let narrowed = self.operand(source, to);
            match self.loc(dest) {
                Loc::Reg(reg) => {
                    self.inst(format!("mov{}", to.suffix()), format!("{narrowed}, {}", reg.operand(to)));
                }
                Loc::Stack(_) => {
                    self.inst(format!("mov{}", to.suffix()), format!("{narrowed}, {}", Reg::Rax.operand(to)));
                    self.store_reg(Reg::Rax, dest);
                }
            }
            return;
        }

        // Sign-extending widening.
        let mnemonic = format!("movs{}{}", from.suffix(), to.suffix());
        let operand = self.operand(source, from);
        match self.loc(dest) {
            Loc::Reg(reg) => {
                self.inst(mnemonic, format!("{operand}, {}", reg.operand(to)));
            }
            Loc::Stack(_) => {
                self.inst(mnemonic, format!("{operand}, {}", Reg::Rax.operand(to)));
                self.store_reg(Reg::Rax, dest);
            }
        }
    }

    fn emit_call(
        &mut self,
        block: BlockId,
        index: usize,
        dest: Local,
        name: &str,
        args: &[RValue],
        variadic: bool,
    ) {
        // Values live across the call that sit in caller-saved registers
        // must survive it on the stack.
        let across = self.calls.live_across(block, index);
        let mut saved: Vec<Reg> = Vec::new();
        for &local in &across {
            if let Some(&color) = self.allocation.registers.get(&local) {
                let reg = ALLOCATABLE[color as usize];
                if reg.is_caller_saved() && !saved.contains(&reg) {
                    self.inst("pushq", reg.operand(Size::from_bytes(8)));
                    self.stack_words += 1;
                    saved.push(reg);
                }
            }
        }

        for (position, arg) in args.iter().take(ARGUMENT_REGISTERS.len()).enumerate() {
            let size = arg.ty().size();
            self.load(arg, ARGUMENT_REGISTERS[position], size);
        }

        let stack_args = args.len().saturating_sub(ARGUMENT_REGISTERS.len()) as u32;
        let filler = (self.stack_words + stack_args) % 2 == 0;
        if filler {
            // Keep %rsp 16-byte aligned at the call; the filler goes in
            // before the arguments so they stay adjacent to the return
            // address.
            self.inst("pushq", "%rcx");
            self.stack_words += 1;
        }

        for arg in args.iter().skip(ARGUMENT_REGISTERS.len()).rev() {
            match arg {
                RValue::Immediate(imm) => self.inst("pushq", format!("${}", imm.read())),
                RValue::Local(local) => match self.loc(*local) {
                    Loc::Reg(reg) => self.inst("pushq", reg.operand(Size::from_bytes(8))),
                    Loc::Stack(offset) => self.inst("pushq", format!("-{offset}(%rbp)")),
                },
            }
            self.stack_words += 1;
        }

        debug_assert_eq!((self.stack_words + 1) % 2, 0, "call boundary must be 16-byte aligned");

        if variadic {
            // No vector registers are used for the variadic tail.
            self.inst("movq", "$0, %rax");
        }
        self.inst("call", format!("{name}@PLT"));

        let popped = stack_args + u32::from(filler);
        if popped > 0 {
            self.inst("addq", format!("${}, %rsp", 8 * popped));
            self.stack_words -= popped;
        }

        if dest.ty != TyId::VOID {
            self.move_reg_to_local(Reg::Rax, dest);
        }

        for reg in saved.into_iter().rev() {
            self.inst("popq", reg.operand(Size::from_bytes(8)));
            self.stack_words -= 1;
        }
    }

    // ---------------------------------------------------------------- //
    // Operand plumbing

    fn loc(&self, local: Local) -> Loc {
        if let Some(&color) = self.allocation.registers.get(&local.id) {
            Loc::Reg(ALLOCATABLE[color as usize])
        } else if let Some(&offset) = self.spill_slots.get(&local.id) {
            Loc::Stack(offset)
        } else {
            panic!("local {local:?} has no allocation");
        }
    }

    fn local_in_reg(&self, rvalue: &RValue, reg: Reg) -> bool {
        matches!(rvalue, RValue::Local(local) if self.loc(*local) == Loc::Reg(reg))
    }

    /// The AT&T spelling of an operand at `size`.
    fn operand(&self, rvalue: &RValue, size: Size) -> String {
        match rvalue {
            RValue::Immediate(imm) => format!("${}", imm.read()),
            RValue::Local(local) => match self.loc(*local) {
                Loc::Reg(reg) => reg.operand(size),
                Loc::Stack(offset) => format!("-{offset}(%rbp)"),
            },
        }
    }

    /// Move `rvalue` into `reg`, skipping the move when it is already
    /// there.
    fn load(&mut self, rvalue: &RValue, reg: Reg, size: Size) {
        if self.local_in_reg(rvalue, reg) {
            return;
        }
        let operand = self.operand(rvalue, size);
        self.inst(format!("mov{}", size.suffix()), format!("{operand}, {}", reg.operand(size)));
    }

    /// Store `reg` into `local`'s home, sized by the local's type.
    fn store_reg(&mut self, reg: Reg, local: Local) {
        let size = local.ty.size();
        let home = self.operand(&RValue::Local(local), size);
        self.inst(format!("mov{}", size.suffix()), format!("{}, {home}", reg.operand(size)));
    }

    fn move_reg_to_local(&mut self, reg: Reg, local: Local) {
        self.store_reg(reg, local);
    }

    /// A sized move of any rvalue into a local, routing memory-to-memory
    /// through the scratch accumulator.
    fn move_rvalue_to_local(&mut self, source: &RValue, dest: Local) {
        let size = dest.ty.size();
        let dest_loc = self.loc(dest);

        match (source, dest_loc) {
            (RValue::Immediate(imm), _) => {
                let home = self.operand(&RValue::Local(dest), size);
                self.inst(format!("mov{}", size.suffix()), format!("${}, {home}", imm.read()));
            }
            (RValue::Local(_), Loc::Reg(reg)) => {
                self.load(source, reg, size);
            }
            (RValue::Local(src), Loc::Stack(_)) => match self.loc(*src) {
                Loc::Reg(reg) => self.store_reg(reg, dest),
                Loc::Stack(_) => {
                    self.load(source, Reg::Rax, size);
                    self.store_reg(Reg::Rax, dest);
                }
            },
        }
    }

    fn block_label(&self, block: BlockId) -> String {
        self.func.block(block).label().to_string()
    }

    fn inst(&mut self, op: impl Into<String>, args: impl Into<String>) {
        self.lines.push(AsmLine::Inst { op: op.into(), args: args.into() });
    }
}

fn escape_asm_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
