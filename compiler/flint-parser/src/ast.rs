//! The abstract syntax tree produced by the parser. Nodes carry the line
//! they started on so the lowering stage can point its semantic
//! diagnostics somewhere useful.

/// A type as written in the source: a named primitive with some number of
/// pointer suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TyExpr {
    pub name: String,
    pub pointer_depth: usize,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub return_ty: TyExpr,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TyExpr,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// One type, any number of declarators: `int a = 1, b;`
    Declaration { ty: TyExpr, declarators: Vec<(String, Option<Expr>)>, line: usize },
    Expr(Expr),
    If { condition: Expr, then_branch: Block, else_branch: Option<Block> },
    While { condition: Expr, body: Block },
    Return { value: Option<Expr>, line: usize },
    Break { line: usize },
    Continue { line: usize },
    Block(Block),
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit { value: i64, line: usize },
    StrLit { value: String, line: usize },
    Var { name: String, line: usize },
    /// `target op= value`; `op` is `None` for a plain assignment.
    Assign { target: Box<Expr>, value: Box<Expr>, op: Option<BinaryOperator>, line: usize },
    Binary { op: BinaryOperator, left: Box<Expr>, right: Box<Expr>, line: usize },
    Unary { op: UnaryOperator, operand: Box<Expr>, line: usize },
    /// `++x`, `x--`, ...
    IncDec { target: Box<Expr>, increment: bool, postfix: bool, line: usize },
    Index { base: Box<Expr>, index: Box<Expr>, line: usize },
    Call { name: String, args: Vec<Expr>, line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::IntLit { line, .. }
            | Expr::StrLit { line, .. }
            | Expr::Var { line, .. }
            | Expr::Assign { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::IncDec { line, .. }
            | Expr::Index { line, .. }
            | Expr::Call { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
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
    BitAnd,
    BitXor,
    BitOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `*p`
    Deref,
    /// `&x`
    AddressOf,
}
