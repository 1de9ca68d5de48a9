//! The IR data model. A [Module] holds one [Function] per source function;
//! a [Function] owns an arena of [BasicBlock]s addressed by [BlockId], a
//! table of [LocalInfo]s addressed by [LocalId], and its string literals.
//! Blocks and locals are append-only while the front-end builds the graph;
//! the optimisation passes rewrite instructions in place, replace
//! terminators, tombstone instruction slots with [Instruction::Nop], and
//! reorder or drop entries of the ordered `body` list.

use index_vec::IndexVec;
use smallvec::SmallVec;

use crate::ty::TyId;

index_vec::define_index_type! {
    /// Index of a [BasicBlock] within its owning [Function]'s block arena.
    pub struct BlockId = u32;
}

index_vec::define_index_type! {
    /// Index of a [LocalInfo] within its owning [Function]'s local table.
    pub struct LocalId = u32;
}

index_vec::define_index_type! {
    /// Index of a string literal within its owning [Function].
    pub struct StringId = u32;
}

/// An IR value identifier: a numeric id plus its type. Local 0 of every
/// function is the return slot; locals 1..=arg_count are the parameters in
/// declaration order. Two locals are the same local exactly when their ids
/// are equal (their types agree by construction).
#[derive(Debug, Copy, Clone)]
pub struct Local {
    pub id: LocalId,
    pub ty: TyId,
}

impl PartialEq for Local {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Local {}

impl std::hash::Hash for Local {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A 64-bit signed constant tagged with a type; the type governs which
/// width of the value is read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Immediate {
    pub value: i64,
    pub ty: TyId,
}

impl Immediate {
    pub fn new(value: i64, ty: TyId) -> Self {
        Self { value, ty }
    }

    /// The value read at the width of the immediate's type.
    pub fn read(&self) -> i64 {
        self.ty.size().read_signed(self.value)
    }
}

/// Anything that can be used as an instruction operand.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RValue {
    Local(Local),
    Immediate(Immediate),
}

impl RValue {
    pub fn as_local(&self) -> Option<Local> {
        match self {
            RValue::Local(local) => Some(*local),
            RValue::Immediate(_) => None,
        }
    }

    pub fn as_immediate(&self) -> Option<Immediate> {
        match self {
            RValue::Immediate(imm) => Some(*imm),
            RValue::Local(_) => None,
        }
    }

    pub fn ty(&self) -> TyId {
        match self {
            RValue::Local(local) => local.ty,
            RValue::Immediate(imm) => imm.ty,
        }
    }
}

impl From<Local> for RValue {
    fn from(local: Local) -> Self {
        RValue::Local(local)
    }
}

impl From<Immediate> for RValue {
    fn from(imm: Immediate) -> Self {
        RValue::Immediate(imm)
    }
}

/// The valid operands of an address-of instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Addressable {
    Local(Local),
    Literal(StringId),
}

/// Binary operations on [RValue]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Xor,
    Or,
}

impl BinOp {
    /// Whether swapping the operands leaves the result unchanged.
    pub fn is_commutative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul | BinOp::And | BinOp::Xor | BinOp::Or)
    }

    /// Whether the operation yields a boolean comparison result.
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge)
    }

    /// The source-level spelling, used by the pretty printer.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&",
            BinOp::Xor => "^",
            BinOp::Or => "|",
        }
    }
}

/// Unary operations on [RValue]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not: `dest := (operand == 0)`.
    LogNot,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::LogNot => "!",
        }
    }
}

/// A linear (non-control) instruction. `Nop` is the tombstone the
/// optimisation passes leave behind when they logically delete a slot;
/// [BasicBlock::compact] removes tombstones after a pass finishes with a
/// block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    BinaryOp { dest: Local, left: RValue, right: RValue, op: BinOp },
    UnaryOp { dest: Local, operand: RValue, op: UnOp },
    Assignment { dest: Local, source: RValue },
    Cast { dest: Local, source: RValue },
    Call { dest: Local, name: String, args: Vec<RValue>, variadic: bool },
    PointerRead { dest: Local, address: RValue },
    PointerWrite { address: RValue, source: RValue },
    AddressOf { dest: Local, source: Addressable },
}

impl Instruction {
    /// The local this instruction writes, if any.
    pub fn destination(&self) -> Option<Local> {
        match self {
            Instruction::BinaryOp { dest, .. }
            | Instruction::UnaryOp { dest, .. }
            | Instruction::Assignment { dest, .. }
            | Instruction::Cast { dest, .. }
            | Instruction::Call { dest, .. }
            | Instruction::PointerRead { dest, .. }
            | Instruction::AddressOf { dest, .. } => Some(*dest),
            Instruction::PointerWrite { .. } | Instruction::Nop => None,
        }
    }

    /// Mutable access to the destination local, if any.
    pub fn destination_mut(&mut self) -> Option<&mut Local> {
        match self {
            Instruction::BinaryOp { dest, .. }
            | Instruction::UnaryOp { dest, .. }
            | Instruction::Assignment { dest, .. }
            | Instruction::Cast { dest, .. }
            | Instruction::Call { dest, .. }
            | Instruction::PointerRead { dest, .. }
            | Instruction::AddressOf { dest, .. } => Some(dest),
            Instruction::PointerWrite { .. } | Instruction::Nop => None,
        }
    }

    /// Visit every [Local] referenced by this instruction, destination
    /// included.
    pub fn for_each_local(&self, mut f: impl FnMut(&Local)) {
        self.for_each_local_impl(&mut |local| f(local));
    }

    /// Visit every [Local] referenced by this instruction mutably; used by
    /// the renumbering pass to remap ids.
    pub fn for_each_local_mut(&mut self, mut f: impl FnMut(&mut Local)) {
        self.for_each_local_mut_impl(&mut |local| f(local));
    }

    fn for_each_local_impl(&self, f: &mut dyn FnMut(&Local)) {
        fn rvalue(rv: &RValue, f: &mut dyn FnMut(&Local)) {
            if let RValue::Local(local) = rv {
                f(local);
            }
        }

        match self {
            Instruction::Nop => {}
            Instruction::BinaryOp { dest, left, right, .. } => {
                f(dest);
                rvalue(left, f);
                rvalue(right, f);
            }
            Instruction::UnaryOp { dest, operand, .. } => {
                f(dest);
                rvalue(operand, f);
            }
            Instruction::Assignment { dest, source } | Instruction::Cast { dest, source } => {
                f(dest);
                rvalue(source, f);
            }
            Instruction::Call { dest, args, .. } => {
                f(dest);
                for arg in args {
                    rvalue(arg, f);
                }
            }
            Instruction::PointerRead { dest, address } => {
                f(dest);
                rvalue(address, f);
            }
            Instruction::PointerWrite { address, source } => {
                rvalue(address, f);
                rvalue(source, f);
            }
            Instruction::AddressOf { dest, source } => {
                f(dest);
                if let Addressable::Local(local) = source {
                    f(local);
                }
            }
        }
    }

    fn for_each_local_mut_impl(&mut self, f: &mut dyn FnMut(&mut Local)) {
        fn rvalue(rv: &mut RValue, f: &mut dyn FnMut(&mut Local)) {
            if let RValue::Local(local) = rv {
                f(local);
            }
        }

        match self {
            Instruction::Nop => {}
            Instruction::BinaryOp { dest, left, right, .. } => {
                f(dest);
                rvalue(left, f);
                rvalue(right, f);
            }
            Instruction::UnaryOp { dest, operand, .. } => {
                f(dest);
                rvalue(operand, f);
            }
            Instruction::Assignment { dest, source } | Instruction::Cast { dest, source } => {
                f(dest);
                rvalue(source, f);
            }
            Instruction::Call { dest, args, .. } => {
                f(dest);
                for arg in args {
                    rvalue(arg, f);
                }
            }
            Instruction::PointerRead { dest, address } => {
                f(dest);
                rvalue(address, f);
            }
            Instruction::PointerWrite { address, source } => {
                rvalue(address, f);
                rvalue(source, f);
            }
            Instruction::AddressOf { dest, source } => {
                f(dest);
                if let Addressable::Local(local) = source {
                    f(local);
                }
            }
        }
    }
}

/// The control-flow instruction at the end of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Jump { target: BlockId },
    ConditionalJump { condition: RValue, on_true: BlockId, on_false: BlockId },
}

impl Terminator {
    /// The blocks this terminator can transfer control to. A conditional
    /// jump yields both targets even when they coincide.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Jump { target } => SmallVec::from_slice(&[*target]),
            Terminator::ConditionalJump { on_true, on_false, .. } => {
                SmallVec::from_slice(&[*on_true, *on_false])
            }
        }
    }

    pub fn for_each_local(&self, mut f: impl FnMut(&Local)) {
        if let Terminator::ConditionalJump { condition: RValue::Local(local), .. } = self {
            f(local);
        }
    }

    pub fn for_each_local_mut(&mut self, mut f: impl FnMut(&mut Local)) {
        if let Terminator::ConditionalJump { condition: RValue::Local(local), .. } = self {
            f(local);
        }
    }
}

/// A node of the control-flow graph: an ordered sequence of instructions
/// plus at most one terminator. The terminator slot is only empty while the
/// front-end is still constructing the block (and permanently for the
/// epilogue, which ends the function).
#[derive(Debug, Clone)]
pub struct BasicBlock {
    label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    fn new(label: String) -> Self {
        Self { label, instructions: Vec::new(), terminator: None }
    }

    /// The unique textual label of this block within its function.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Append an instruction to the block.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Install (or replace) the block's terminator.
    pub fn terminate(&mut self, terminator: Terminator) {
        self.terminator = Some(terminator);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Remove the tombstones a pass left behind.
    pub fn compact(&mut self) {
        self.instructions.retain(|instr| !matches!(instr, Instruction::Nop));
    }
}

/// Information about a local variable: its type, and its source name when
/// it is user-defined rather than a compiler temporary.
#[derive(Debug, Clone)]
pub struct LocalInfo {
    pub ty: TyId,
    pub name: Option<String>,
}

impl LocalInfo {
    pub fn is_temporary(&self) -> bool {
        self.name.is_none()
    }
}

/// A function in the form of a control-flow graph.
#[derive(Debug)]
pub struct Function {
    name: String,
    arg_count: usize,

    /// Information about all local variables. Always at least
    /// `arg_count + 1` elements: the return slot `_0` and the arguments
    /// `_1` to `_arg_count`.
    pub locals: IndexVec<LocalId, LocalInfo>,

    /// The block arena. Blocks are appended here and never removed;
    /// dropping a block from the layout only removes its [BlockId] from
    /// `body`.
    blocks: IndexVec<BlockId, BasicBlock>,

    /// The ordered layout of the function body. Does not contain the
    /// prologue or epilogue, which have fixed positions around it.
    pub body: Vec<BlockId>,

    prologue: BlockId,
    epilogue: BlockId,

    literals: IndexVec<StringId, String>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_ty: TyId) -> Self {
        let name = name.into();
        let mut blocks = IndexVec::new();
        let prologue = blocks.push(BasicBlock::new(format!(".{name}.prologue")));
        let epilogue = blocks.push(BasicBlock::new(format!(".{name}.epilogue")));

        let mut locals = IndexVec::new();
        locals.push(LocalInfo { ty: return_ty, name: None });

        Self { name, arg_count: 0, locals, blocks, body: Vec::new(), prologue, epilogue, literals: IndexVec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    /// Declare the next parameter. Parameters must be declared before any
    /// other local is allocated so that they occupy ids `1..=arg_count`.
    pub fn new_param(&mut self, name: impl Into<String>, ty: TyId) -> Local {
        assert_eq!(self.locals.len(), self.arg_count + 1, "parameters must be declared first");
        self.arg_count += 1;
        self.new_named_local(name, ty)
    }

    /// Allocate a new temporary local variable.
    pub fn new_local(&mut self, ty: TyId) -> Local {
        let id = self.locals.push(LocalInfo { ty, name: None });
        Local { id, ty }
    }

    /// Allocate a new named local variable.
    pub fn new_named_local(&mut self, name: impl Into<String>, ty: TyId) -> Local {
        let id = self.locals.push(LocalInfo { ty, name: Some(name.into()) });
        Local { id, ty }
    }

    /// The distinguished return slot, local `_0`.
    pub fn return_local(&self) -> Local {
        let id = LocalId::from_usize(0);
        Local { id, ty: self.locals[id].ty }
    }

    /// The `index`-th parameter (1-based).
    pub fn param(&self, index: usize) -> Local {
        debug_assert!(index >= 1 && index <= self.arg_count);
        let id = LocalId::from_usize(index);
        Local { id, ty: self.locals[id].ty }
    }

    pub fn return_ty(&self) -> TyId {
        self.locals[LocalId::from_usize(0)].ty
    }

    /// Allocate a new [BasicBlock] in the body of this function.
    pub fn new_block(&mut self) -> BlockId {
        let index = self.blocks.len() - 2;
        let label = format!(".{}.BB{index}", self.name);
        let id = self.blocks.push(BasicBlock::new(label));
        self.body.push(id);
        id
    }

    pub fn prologue(&self) -> BlockId {
        self.prologue
    }

    pub fn epilogue(&self) -> BlockId {
        self.epilogue
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id]
    }

    /// The number of blocks ever allocated, including dropped ones; the
    /// upper bound for [BlockId]-indexed side tables.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The complete layout of the function: prologue, the ordered body,
    /// then the epilogue.
    pub fn layout(&self) -> impl Iterator<Item = BlockId> + '_ {
        std::iter::once(self.prologue)
            .chain(self.body.iter().copied())
            .chain(std::iter::once(self.epilogue))
    }

    /// Move the instructions of `from` onto the end of `to`. Used when an
    /// optimisation pass merges a single-predecessor block into its
    /// predecessor.
    pub fn merge_instructions(&mut self, to: BlockId, from: BlockId) {
        debug_assert_ne!(to, from);
        let moved = std::mem::take(&mut self.blocks[from].instructions);
        self.blocks[to].instructions.extend(moved);
    }

    /// Intern a string literal and return its id.
    pub fn new_literal(&mut self, value: impl Into<String>) -> StringId {
        self.literals.push(value.into())
    }

    pub fn literals(&self) -> &IndexVec<StringId, String> {
        &self.literals
    }
}

/// A compiled translation unit: every function of the source file, in
/// declaration order.
#[derive(Debug, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_compare_by_id() {
        let a = Local { id: LocalId::from_usize(3), ty: TyId::INT };
        let b = Local { id: LocalId::from_usize(3), ty: TyId::INT };
        let c = Local { id: LocalId::from_usize(4), ty: TyId::INT };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn block_labels_follow_the_function_name() {
        let mut func = Function::new("main", TyId::INT);
        let b0 = func.new_block();
        let b1 = func.new_block();
        assert_eq!(func.block(func.prologue()).label(), ".main.prologue");
        assert_eq!(func.block(func.epilogue()).label(), ".main.epilogue");
        assert_eq!(func.block(b0).label(), ".main.BB0");
        assert_eq!(func.block(b1).label(), ".main.BB1");
    }

    #[test]
    fn parameters_take_the_low_ids() {
        let mut func = Function::new("min", TyId::INT);
        let x = func.new_param("x", TyId::INT);
        let y = func.new_param("y", TyId::INT);
        let tmp = func.new_local(TyId::INT);
        assert_eq!(func.return_local().id.index(), 0);
        assert_eq!(x.id.index(), 1);
        assert_eq!(y.id.index(), 2);
        assert_eq!(tmp.id.index(), 3);
        assert_eq!(func.arg_count(), 2);
        assert_eq!(func.param(2), y);
    }

    #[test]
    fn compaction_removes_tombstones() {
        let mut func = Function::new("f", TyId::VOID);
        let b = func.new_block();
        let dest = func.new_local(TyId::INT);
        let block = func.block_mut(b);
        block.push(Instruction::Nop);
        block.push(Instruction::Assignment {
            dest,
            source: RValue::Immediate(Immediate::new(1, TyId::INT)),
        });
        block.push(Instruction::Nop);
        block.compact();
        assert_eq!(block.instructions.len(), 1);
    }
}
