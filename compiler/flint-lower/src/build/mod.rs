//! Lowering of the parsed AST into Flint IR. One [Function] is built per
//! source function: control flow becomes blocks and terminators,
//! expressions become three-address instructions over fresh temporaries,
//! and the usual arithmetic conversions are made explicit with `Cast`
//! instructions so the back-end never has to repair operand widths.
//!
//! Semantic errors (undeclared names, duplicate declarations, arity
//! mismatches, pointer misuse, unknown types) are reported through the
//! [Reporter]; lowering continues best-effort so several errors can be
//! reported in one run, and a poisoned reporter suppresses code
//! generation for the whole module.
pub mod symbols;

use flint_ir::{
    Addressable, BinOp, BlockId, Function, Immediate, Instruction, Local, Module, RValue,
    Terminator, TyId, UnOp,
};
use flint_parser::ast::{
    BinaryOperator, Block, Expr, FunctionDef, Program, Stmt, TyExpr, UnaryOperator,
};
use flint_reporting::{Report, Reporter};
use indexmap::IndexMap;
use log::debug;
use symbols::SymbolTable;

/// The callable surface visible to every function body: the implicitly
/// declared foreign functions plus every function defined in the module.
#[derive(Debug, Clone)]
struct FnSignature {
    return_ty: TyId,
    params: Vec<TyId>,
    variadic: bool,
}

fn builtin_signatures() -> IndexMap<String, FnSignature> {
    let void_ptr = TyId::pointer_to(TyId::VOID);
    let char_ptr = TyId::pointer_to(TyId::CHAR);

    IndexMap::from([
        (
            "putchar".to_string(),
            FnSignature { return_ty: TyId::INT, params: vec![TyId::INT], variadic: false },
        ),
        (
            "getchar".to_string(),
            FnSignature { return_ty: TyId::INT, params: vec![], variadic: false },
        ),
        (
            "malloc".to_string(),
            FnSignature { return_ty: void_ptr, params: vec![TyId::LONG], variadic: false },
        ),
        (
            "free".to_string(),
            FnSignature { return_ty: TyId::VOID, params: vec![void_ptr], variadic: false },
        ),
        (
            "printf".to_string(),
            FnSignature { return_ty: TyId::INT, params: vec![char_ptr], variadic: true },
        ),
    ])
}

/// Lower a whole translation unit. Returns `None` when any semantic error
/// was reported; the module must not be code-generated in that case.
pub fn lower_program(program: &Program, reporter: &mut Reporter) -> Option<Module> {
    let mut signatures = builtin_signatures();

    for def in &program.functions {
        let return_ty = resolve_ty(&def.return_ty, def.line, reporter);
        let params =
            def.params.iter().map(|p| resolve_ty(&p.ty, def.line, reporter)).collect::<Vec<_>>();

        if signatures
            .insert(def.name.clone(), FnSignature { return_ty, params, variadic: false })
            .is_some()
            && program.functions.iter().filter(|f| f.name == def.name).count() > 1
        {
            reporter.emit(Report::error(format!(
                "line {}: duplicate declaration of function `{}`",
                def.line, def.name
            )));
        }
    }

    let mut module = Module::default();
    for def in &program.functions {
        module.functions.push(FunctionLowering::new(def, &signatures, reporter).lower(def));
    }

    if reporter.has_errors() {
        None
    } else {
        Some(module)
    }
}

fn resolve_ty(ty: &TyExpr, line: usize, reporter: &mut Reporter) -> TyId {
    let mut resolved = match TyId::from_name(&ty.name) {
        Some(base) => base,
        None => {
            reporter.emit(Report::error(format!("line {line}: unknown type `{}`", ty.name)));
            TyId::INT
        }
    };
    for _ in 0..ty.pointer_depth {
        resolved = TyId::pointer_to(resolved);
    }
    resolved
}

/// Either a plain local or a location behind a pointer; the two shapes an
/// assignable expression can lower to.
enum Place {
    Local(Local),
    Deref { address: RValue, pointee: TyId },
}

struct LoopTargets {
    continue_target: BlockId,
    break_target: BlockId,
}

struct FunctionLowering<'ctx> {
    func: Function,
    symbols: SymbolTable,
    signatures: &'ctx IndexMap<String, FnSignature>,
    reporter: &'ctx mut Reporter,
    current: BlockId,
    loops: Vec<LoopTargets>,
}

impl<'ctx> FunctionLowering<'ctx> {
    fn new(
        def: &FunctionDef,
        signatures: &'ctx IndexMap<String, FnSignature>,
        reporter: &'ctx mut Reporter,
    ) -> Self {
        let return_ty = signatures[&def.name].return_ty;
        let func = Function::new(&def.name, return_ty);
        let current = func.prologue();
        Self { func, symbols: SymbolTable::new(), signatures, reporter, current, loops: Vec::new() }
    }

    fn lower(mut self, def: &FunctionDef) -> Function {
        self.symbols.push_scope();
        for (index, param) in def.params.iter().enumerate() {
            let ty = self.signatures[&def.name].params.get(index).copied().unwrap_or(TyId::INT);
            let local = self.func.new_param(&param.name, ty);
            if self.symbols.declare(&param.name, local).is_err() {
                self.error(def.line, format!("duplicate declaration of parameter `{}`", param.name));
            }
        }

        let entry = self.func.new_block();
        self.func.block_mut(self.func.prologue()).terminate(Terminator::Jump { target: entry });
        self.current = entry;

        // `main` returns 0 when control falls off the end.
        if def.name == "main" {
            let ret = self.func.return_local();
            self.emit(Instruction::Assignment {
                dest: ret,
                source: RValue::Immediate(Immediate::new(0, ret.ty)),
            });
        }

        self.lower_block(&def.body);

        let epilogue = self.func.epilogue();
        self.func.block_mut(self.current).terminate(Terminator::Jump { target: epilogue });
        self.symbols.pop_scope();

        debug!("lowered `{}`: {} locals", self.func.name(), self.func.locals.len());
        self.func
    }

    fn error(&mut self, line: usize, message: impl std::fmt::Display) {
        self.reporter.emit(Report::error(format!("line {line}: {message}")));
    }

    fn emit(&mut self, instruction: Instruction) {
        self.func.block_mut(self.current).push(instruction);
    }

    /// Terminate the current block and continue lowering into a fresh one.
    /// The fresh block is unreachable when the terminator was a jump away
    /// (after `return`/`break`/`continue`); reordering drops it later.
    fn terminate_and_continue(&mut self, terminator: Terminator) {
        self.func.block_mut(self.current).terminate(terminator);
        self.current = self.func.new_block();
    }

    // ---------------------------------------------------------------- //
    // Statements

    fn lower_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.lower_statement(statement);
        }
    }

    fn lower_statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Declaration { ty, declarators, line } => {
                let ty = resolve_ty(ty, *line, self.reporter);
                if ty == TyId::VOID {
                    self.error(*line, "cannot declare a variable of type `void`");
                    return;
                }

                for (name, init) in declarators {
                    let local = self.func.new_named_local(name, ty);
                    if self.symbols.declare(name, local).is_err() {
                        self.error(*line, format!("duplicate declaration of `{name}`"));
                    }
                    if let Some(init) = init {
                        let value = self.lower_expr(init);
                        let value = self.cast_to(value, ty);
                        self.emit(Instruction::Assignment { dest: local, source: value });
                    }
                }
            }
            Stmt::Expr(expr) => {
                self.lower_expr(expr);
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let cond = self.lower_expr(condition);
                let then_block = self.func.new_block();
                let join = self.func.new_block();
                let else_block = match else_branch {
                    Some(_) => self.func.new_block(),
                    None => join,
                };

                self.func.block_mut(self.current).terminate(Terminator::ConditionalJump {
                    condition: cond,
                    on_true: then_block,
                    on_false: else_block,
                });

                self.current = then_block;
                self.scoped_block(then_branch);
                self.func.block_mut(self.current).terminate(Terminator::Jump { target: join });

                if let Some(else_branch) = else_branch {
                    self.current = else_block;
                    self.scoped_block(else_branch);
                    self.func
                        .block_mut(self.current)
                        .terminate(Terminator::Jump { target: join });
                }

                self.current = join;
            }
            Stmt::While { condition, body } => {
                let cond_block = self.func.new_block();
                self.func
                    .block_mut(self.current)
                    .terminate(Terminator::Jump { target: cond_block });

                self.current = cond_block;
                let cond = self.lower_expr(condition);
                let body_block = self.func.new_block();
                let exit = self.func.new_block();
                self.func.block_mut(self.current).terminate(Terminator::ConditionalJump {
                    condition: cond,
                    on_true: body_block,
                    on_false: exit,
                });

                self.loops
                    .push(LoopTargets { continue_target: cond_block, break_target: exit });
                self.current = body_block;
                self.scoped_block(body);
                self.func
                    .block_mut(self.current)
                    .terminate(Terminator::Jump { target: cond_block });
                self.loops.pop();

                self.current = exit;
            }
            Stmt::Return { value, line: _ } => {
                if let Some(value) = value {
                    let lowered = self.lower_expr(value);
                    let return_ty = self.func.return_ty();
                    if return_ty != TyId::VOID {
                        let lowered = self.cast_to(lowered, return_ty);
                        let dest = self.func.return_local();
                        self.emit(Instruction::Assignment { dest, source: lowered });
                    }
                }
                let epilogue = self.func.epilogue();
                self.terminate_and_continue(Terminator::Jump { target: epilogue });
            }
            Stmt::Break { line } => match self.loops.last() {
                Some(targets) => {
                    let target = targets.break_target;
                    self.terminate_and_continue(Terminator::Jump { target });
                }
                None => self.error(*line, "`break` outside of a loop"),
            },
            Stmt::Continue { line } => match self.loops.last() {
                Some(targets) => {
                    let target = targets.continue_target;
                    self.terminate_and_continue(Terminator::Jump { target });
                }
                None => self.error(*line, "`continue` outside of a loop"),
            },
            Stmt::Block(block) => self.scoped_block(block),
        }
    }

    fn scoped_block(&mut self, block: &Block) {
        self.symbols.push_scope();
        self.lower_block(block);
        self.symbols.pop_scope();
    }

    // ---------------------------------------------------------------- //
    // Expressions

    fn lower_expr(&mut self, expr: &Expr) -> RValue {
        match expr {
            Expr::IntLit { value, .. } => RValue::Immediate(Immediate::new(*value, TyId::INT)),
            Expr::StrLit { value, .. } => {
                let id = self.func.new_literal(value.clone());
                let dest = self.func.new_local(TyId::pointer_to(TyId::CHAR));
                self.emit(Instruction::AddressOf { dest, source: Addressable::Literal(id) });
                RValue::Local(dest)
            }
            Expr::Var { name, line } => match self.symbols.lookup(name) {
                Some(local) => RValue::Local(local),
                None => {
                    self.error(*line, format!("undeclared variable `{name}`"));
                    RValue::Immediate(Immediate::new(0, TyId::INT))
                }
            },
            Expr::Assign { target, value, op, line } => {
                let place = self.lower_place(target);
                let result = match op {
                    None => self.lower_expr(value),
                    Some(op) => {
                        let current = self.read_place(&place);
                        let rhs = self.lower_expr(value);
                        self.lower_binary_values(map_binop(*op), current, rhs, *line)
                    }
                };
                self.write_place(&place, result)
            }
            Expr::Binary { op, left, right, line } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                self.lower_binary_values(map_binop(*op), left, right, *line)
            }
            Expr::Unary { op, operand, line } => match op {
                UnaryOperator::Neg => {
                    let value = self.lower_expr(operand);
                    let value = self.promote(value);
                    let dest = self.func.new_local(value.ty());
                    self.emit(Instruction::UnaryOp { dest, operand: value, op: UnOp::Neg });
                    RValue::Local(dest)
                }
                UnaryOperator::Not => {
                    let value = self.lower_expr(operand);
                    let dest = self.func.new_local(TyId::BOOL);
                    self.emit(Instruction::UnaryOp { dest, operand: value, op: UnOp::LogNot });
                    RValue::Local(dest)
                }
                UnaryOperator::Deref => {
                    let place = self.lower_deref_place(operand, *line);
                    self.read_place(&place)
                }
                UnaryOperator::AddressOf => match self.lower_place(operand) {
                    Place::Local(local) => {
                        let dest = self.func.new_local(TyId::pointer_to(local.ty));
                        self.emit(Instruction::AddressOf {
                            dest,
                            source: Addressable::Local(local),
                        });
                        RValue::Local(dest)
                    }
                    // `&*p` and `&p[i]` are just the address itself.
                    Place::Deref { address, .. } => address,
                },
            },
            Expr::IncDec { target, increment, postfix, line } => {
                let place = self.lower_place(target);
                let old = self.read_place(&place);

                // The postfix result is the value before the update, so it
                // has to survive in its own temporary.
                let snapshot = if *postfix {
                    let tmp = self.func.new_local(old.ty());
                    self.emit(Instruction::Assignment { dest: tmp, source: old });
                    Some(RValue::Local(tmp))
                } else {
                    None
                };

                let op = if *increment { BinOp::Add } else { BinOp::Sub };
                let one = RValue::Immediate(Immediate::new(1, TyId::INT));
                let new = self.lower_binary_values(op, old, one, *line);
                let written = self.write_place(&place, new);
                snapshot.unwrap_or(written)
            }
            Expr::Index { base, index, line } => {
                let place = self.lower_index_place(base, index, *line);
                self.read_place(&place)
            }
            Expr::Call { name, args, line } => self.lower_call(name, args, *line),
        }
    }

    fn lower_call(&mut self, name: &str, args: &[Expr], line: usize) -> RValue {
        let Some(signature) = self.signatures.get(name).cloned() else {
            self.error(line, format!("call to undeclared function `{name}`"));
            for arg in args {
                self.lower_expr(arg);
            }
            return RValue::Immediate(Immediate::new(0, TyId::INT));
        };

        let arity_ok = if signature.variadic {
            args.len() >= signature.params.len()
        } else {
            args.len() == signature.params.len()
        };
        if !arity_ok {
            self.error(
                line,
                format!(
                    "`{name}` expects {} argument(s) but {} were supplied",
                    signature.params.len(),
                    args.len()
                ),
            );
        }

        let mut lowered = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let value = self.lower_expr(arg);
            let value = match signature.params.get(index) {
                Some(&param_ty) => self.cast_to(value, param_ty),
                // Default argument promotions for the variadic tail.
                None => self.promote(value),
            };
            lowered.push(value);
        }

        let dest = self.func.new_local(signature.return_ty);
        self.emit(Instruction::Call {
            dest,
            name: name.to_string(),
            args: lowered,
            variadic: signature.variadic,
        });
        RValue::Local(dest)
    }

    // ---------------------------------------------------------------- //
    // Places and conversions

    fn lower_place(&mut self, expr: &Expr) -> Place {
        match expr {
            Expr::Var { name, line } => match self.symbols.lookup(name) {
                Some(local) => Place::Local(local),
                None => {
                    self.error(*line, format!("undeclared variable `{name}`"));
                    let dead = self.func.new_local(TyId::INT);
                    Place::Local(dead)
                }
            },
            Expr::Unary { op: UnaryOperator::Deref, operand, line } => {
                self.lower_deref_place(operand, *line)
            }
            Expr::Index { base, index, line } => self.lower_index_place(base, index, *line),
            other => {
                self.error(other.line(), "expression is not assignable");
                let dead = self.func.new_local(TyId::INT);
                Place::Local(dead)
            }
        }
    }

    fn lower_deref_place(&mut self, operand: &Expr, line: usize) -> Place {
        let address = self.lower_expr(operand);
        match address.ty().pointee() {
            Some(pointee) => Place::Deref { address, pointee },
            None => {
                self.error(line, format!("cannot dereference non-pointer type `{}`", address.ty()));
                let dead = self.func.new_local(TyId::INT);
                Place::Local(dead)
            }
        }
    }

    fn lower_index_place(&mut self, base: &Expr, index: &Expr, line: usize) -> Place {
        let base = self.lower_expr(base);
        let index = self.lower_expr(index);
        match base.ty().pointee() {
            Some(pointee) => {
                let address = self.pointer_offset(BinOp::Add, base, index, pointee);
                Place::Deref { address, pointee }
            }
            None => {
                self.error(line, format!("cannot index non-pointer type `{}`", base.ty()));
                let dead = self.func.new_local(TyId::INT);
                Place::Local(dead)
            }
        }
    }

    fn read_place(&mut self, place: &Place) -> RValue {
        match place {
            Place::Local(local) => RValue::Local(*local),
            Place::Deref { address, pointee } => {
                let dest = self.func.new_local(*pointee);
                self.emit(Instruction::PointerRead { dest, address: *address });
                RValue::Local(dest)
            }
        }
    }

    /// Store `value` into `place`, inserting the conversion to the
    /// location's type. Returns the stored value.
    fn write_place(&mut self, place: &Place, value: RValue) -> RValue {
        match place {
            Place::Local(local) => {
                let value = self.cast_to(value, local.ty);
                self.emit(Instruction::Assignment { dest: *local, source: value });
                value
            }
            Place::Deref { address, pointee } => {
                let value = self.cast_to(value, *pointee);
                self.emit(Instruction::PointerWrite { address: *address, source: value });
                value
            }
        }
    }

    /// Convert `value` to `ty`, emitting a `Cast` through a fresh
    /// temporary when the types differ.
    fn cast_to(&mut self, value: RValue, ty: TyId) -> RValue {
        if value.ty() == ty || ty == TyId::VOID {
            return value;
        }
        let dest = self.func.new_local(ty);
        self.emit(Instruction::Cast { dest, source: value });
        RValue::Local(dest)
    }

    /// The integer promotions: anything narrower than `int` widens to
    /// `int` before arithmetic.
    fn promote(&mut self, value: RValue) -> RValue {
        let ty = value.ty();
        if !ty.is_pointer() && ty.size().bytes() < 4 {
            self.cast_to(value, TyId::INT)
        } else {
            value
        }
    }

    /// Bring two integer operands to a common type.
    fn balance(&mut self, left: RValue, right: RValue) -> (RValue, RValue, TyId) {
        let left = self.promote(left);
        let right = self.promote(right);
        let common = if left.ty().size().bytes() == 8 || right.ty().size().bytes() == 8 {
            TyId::LONG
        } else {
            TyId::INT
        };
        (self.cast_to(left, common), self.cast_to(right, common), common)
    }

    fn lower_binary_values(&mut self, op: BinOp, left: RValue, right: RValue, line: usize) -> RValue {
        let left_pointee = left.ty().pointee();
        let right_pointee = right.ty().pointee();

        // Pointer arithmetic scales the integer operand by the pointee
        // size.
        if matches!(op, BinOp::Add | BinOp::Sub) && (left_pointee.is_some() || right_pointee.is_some())
        {
            return match (left_pointee, right_pointee) {
                (Some(pointee), None) => self.pointer_offset(op, left, right, pointee),
                (None, Some(pointee)) if op == BinOp::Add => {
                    self.pointer_offset(op, right, left, pointee)
                }
                _ => {
                    self.error(line, "invalid pointer arithmetic");
                    left
                }
            };
        }

        if op.is_comparison() {
            let (left, right) = if left_pointee.is_some() && right_pointee.is_some() {
                (left, right)
            } else if left_pointee.is_some() || right_pointee.is_some() {
                self.error(line, "cannot compare a pointer with an integer");
                (left, right)
            } else {
                let (left, right, _) = self.balance(left, right);
                (left, right)
            };
            let dest = self.func.new_local(TyId::BOOL);
            self.emit(Instruction::BinaryOp { dest, left, right, op });
            return RValue::Local(dest);
        }

        if left_pointee.is_some() || right_pointee.is_some() {
            self.error(line, format!("pointer operand is invalid for `{}`", op.symbol()));
            return left;
        }

        let (left, right, common) = self.balance(left, right);
        let dest = self.func.new_local(common);
        self.emit(Instruction::BinaryOp { dest, left, right, op });
        RValue::Local(dest)
    }

    /// `base ± index * sizeof(pointee)`, yielding a value of `base`'s
    /// pointer type.
    fn pointer_offset(&mut self, op: BinOp, base: RValue, index: RValue, pointee: TyId) -> RValue {
        let index = self.cast_to(index, TyId::LONG);
        let scale = pointee.size().bytes().max(1) as i64;
        let scaled = if scale == 1 {
            index
        } else {
            let dest = self.func.new_local(TyId::LONG);
            self.emit(Instruction::BinaryOp {
                dest,
                left: index,
                right: RValue::Immediate(Immediate::new(scale, TyId::LONG)),
                op: BinOp::Mul,
            });
            RValue::Local(dest)
        };

        let dest = self.func.new_local(base.ty());
        self.emit(Instruction::BinaryOp { dest, left: base, right: scaled, op });
        RValue::Local(dest)
    }
}

fn map_binop(op: BinaryOperator) -> BinOp {
    match op {
        BinaryOperator::Add => BinOp::Add,
        BinaryOperator::Sub => BinOp::Sub,
        BinaryOperator::Mul => BinOp::Mul,
        BinaryOperator::Div => BinOp::Div,
        BinaryOperator::Mod => BinOp::Mod,
        BinaryOperator::Eq => BinOp::Eq,
        BinaryOperator::Neq => BinOp::Neq,
        BinaryOperator::Lt => BinOp::Lt,
        BinaryOperator::Gt => BinOp::Gt,
        BinaryOperator::Le => BinOp::Le,
        BinaryOperator::Ge => BinOp::Ge,
        BinaryOperator::BitAnd => BinOp::And,
        BinaryOperator::BitXor => BinOp::Xor,
        BinaryOperator::BitOr => BinOp::Or,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_parser::parse_program;

    fn lower(source: &str) -> (Option<Module>, Reporter) {
        let program = parse_program(source).unwrap();
        let mut reporter = Reporter::new();
        let module = lower_program(&program, &mut reporter);
        (module, reporter)
    }

    #[test]
    fn a_simple_function_lowers_cleanly() {
        let (module, reporter) = lower("int main() { int x = 1; return x + 2; }");
        assert!(!reporter.has_errors());
        let module = module.unwrap();
        assert_eq!(module.functions.len(), 1);
        let main = &module.functions[0];
        assert_eq!(main.name(), "main");
        assert_eq!(main.arg_count(), 0);
        // Return slot, x, and at least one temporary.
        assert!(main.locals.len() >= 3);
    }

    #[test]
    fn undeclared_variables_poison_the_module() {
        let (module, reporter) = lower("int main() { return y; }");
        assert!(module.is_none());
        assert_eq!(reporter.error_count(), 1);
    }

    #[test]
    fn shadowing_is_allowed_but_redeclaration_is_not() {
        let (module, _) = lower("int main() { int a = 0; { int a = 7; } return a; }");
        assert!(module.is_some());

        let (module, reporter) = lower("int main() { int a = 0; int a = 1; return a; }");
        assert!(module.is_none());
        assert!(reporter.has_errors());
    }

    #[test]
    fn arity_mismatches_are_reported() {
        let (module, _) =
            lower("int f(int x) { return x; } int main() { return f(1, 2); }");
        assert!(module.is_none());
    }

    #[test]
    fn pointer_misuse_is_reported() {
        let (module, reporter) = lower("int main() { int x = 0; return *x; }");
        assert!(module.is_none());
        assert_eq!(reporter.error_count(), 1);

        let (module, _) = lower("int main() { int x = 0; return x[1]; }");
        assert!(module.is_none());
    }

    #[test]
    fn address_of_and_deref_round_trip() {
        let (module, reporter) =
            lower("int main() { int x = 5; int* p = &x; *p = *p + 1; return x; }");
        assert!(!reporter.has_errors());
        let main = &module.unwrap().functions[0];

        let mut saw_address_of = false;
        let mut saw_read = false;
        let mut saw_write = false;
        for block in main.layout() {
            for instruction in &main.block(block).instructions {
                match instruction {
                    Instruction::AddressOf { .. } => saw_address_of = true,
                    Instruction::PointerRead { .. } => saw_read = true,
                    Instruction::PointerWrite { .. } => saw_write = true,
                    _ => {}
                }
            }
        }
        assert!(saw_address_of && saw_read && saw_write);
    }

    #[test]
    fn narrow_operands_are_promoted() {
        let (module, _) = lower("int main() { char c = 'a'; return c + 1; }");
        let main = &module.unwrap().functions[0];
        let mut saw_cast = false;
        for block in main.layout() {
            for instruction in &main.block(block).instructions {
                if let Instruction::Cast { dest, .. } = instruction {
                    if dest.ty == TyId::INT {
                        saw_cast = true;
                    }
                }
            }
        }
        assert!(saw_cast, "char operand must be promoted to int");
    }

    #[test]
    fn indexing_scales_by_the_pointee_size() {
        let (module, _) = lower("int main() { int* p = malloc(40); return p[2]; }");
        let main = &module.unwrap().functions[0];
        let mut saw_scale = false;
        for block in main.layout() {
            for instruction in &main.block(block).instructions {
                if let Instruction::BinaryOp { right: RValue::Immediate(imm), op: BinOp::Mul, .. } =
                    instruction
                {
                    if imm.value == 4 {
                        saw_scale = true;
                    }
                }
            }
        }
        assert!(saw_scale, "int indexing must scale by 4");
    }

    #[test]
    fn break_outside_a_loop_is_an_error() {
        let (module, _) = lower("int main() { break; return 0; }");
        assert!(module.is_none());
    }
}
