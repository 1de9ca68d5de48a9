//! The recursive-descent parser. Expressions are parsed with one function
//! per precedence level, assignment being right-associative and lowest;
//! statements and definitions are straightforward descent over the token
//! stream.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};

/// Parse a full translation unit.
pub fn parse_program(source: &str) -> ParseResult<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, position: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.position].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn line(&self) -> usize {
        self.tokens[self.position].line
    }

    fn bump(&mut self) -> TokenKind {
        let token = self.tokens[self.position].kind.clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek() == &kind {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected {} but found {}", kind.describe(), self.peek().describe()),
                self.line(),
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            TokenKind::Ident(_) => match self.bump() {
                TokenKind::Ident(name) => Ok(name),
                _ => unreachable!(),
            },
            other => Err(ParseError::new(
                format!("expected identifier but found {}", other.describe()),
                self.line(),
            )),
        }
    }

    fn at_type_keyword(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::KwInt
                | TokenKind::KwChar
                | TokenKind::KwShort
                | TokenKind::KwLong
                | TokenKind::KwBool
                | TokenKind::KwVoid
        )
    }

    fn parse_type(&mut self) -> ParseResult<TyExpr> {
        let name = match self.peek() {
            TokenKind::KwInt => "int",
            TokenKind::KwChar => "char",
            TokenKind::KwShort => "short",
            TokenKind::KwLong => "long",
            TokenKind::KwBool => "bool",
            TokenKind::KwVoid => "void",
            other => {
                return Err(ParseError::new(
                    format!("expected a type but found {}", other.describe()),
                    self.line(),
                ));
            }
        }
        .to_string();
        self.bump();

        let mut pointer_depth = 0;
        while self.eat(&TokenKind::Star) {
            pointer_depth += 1;
        }

        Ok(TyExpr { name, pointer_depth })
    }

    fn parse_program(mut self) -> ParseResult<Program> {
        let mut functions = Vec::new();
        while self.peek() != &TokenKind::Eof {
            functions.push(self.parse_function()?);
        }
        Ok(Program { functions })
    }

    fn parse_function(&mut self) -> ParseResult<FunctionDef> {
        let line = self.line();
        let return_ty = self.parse_type()?;
        let name = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let name = self.expect_ident()?;
                params.push(Param { ty, name });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let body = self.parse_block()?;
        Ok(FunctionDef { return_ty, name, params, body, line })
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            if self.peek() == &TokenKind::Eof {
                return Err(ParseError::new("unexpected end of file in block", self.line()));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Block { statements })
    }

    /// A single statement used as an `if`/`while` body still lowers as a
    /// block of its own.
    fn parse_braced_or_single(&mut self) -> ParseResult<Block> {
        if self.peek() == &TokenKind::LBrace {
            self.parse_block()
        } else {
            Ok(Block { statements: vec![self.parse_statement()?] })
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        match self.peek() {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::KwIf => {
                self.bump();
                self.expect(TokenKind::LParen)?;
                let condition = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                let then_branch = self.parse_braced_or_single()?;
                let else_branch = if self.eat(&TokenKind::KwElse) {
                    Some(self.parse_braced_or_single()?)
                } else {
                    None
                };
                Ok(Stmt::If { condition, then_branch, else_branch })
            }
            TokenKind::KwWhile => {
                self.bump();
                self.expect(TokenKind::LParen)?;
                let condition = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                let body = self.parse_braced_or_single()?;
                Ok(Stmt::While { condition, body })
            }
            TokenKind::KwReturn => {
                self.bump();
                let value = if self.peek() == &TokenKind::Semi {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Return { value, line })
            }
            TokenKind::KwBreak => {
                self.bump();
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Break { line })
            }
            TokenKind::KwContinue => {
                self.bump();
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Continue { line })
            }
            _ if self.at_type_keyword() => {
                let ty = self.parse_type()?;
                let mut declarators = Vec::new();
                loop {
                    let name = self.expect_ident()?;
                    let init = if self.eat(&TokenKind::Assign) {
                        Some(self.parse_assignment()?)
                    } else {
                        None
                    };
                    declarators.push((name, init));
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Declaration { ty, declarators, line })
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let left = self.parse_bit_or()?;

        let op = match self.peek() {
            TokenKind::Assign => None,
            TokenKind::PlusAssign => Some(BinaryOperator::Add),
            TokenKind::MinusAssign => Some(BinaryOperator::Sub),
            TokenKind::StarAssign => Some(BinaryOperator::Mul),
            TokenKind::SlashAssign => Some(BinaryOperator::Div),
            TokenKind::PercentAssign => Some(BinaryOperator::Mod),
            _ => return Ok(left),
        };
        self.bump();

        // Right-associative.
        let value = self.parse_assignment()?;
        Ok(Expr::Assign { target: Box::new(left), value: Box::new(value), op, line })
    }

    fn parse_bit_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bit_xor()?;
        while self.peek() == &TokenKind::Pipe {
            let line = self.line();
            self.bump();
            let right = self.parse_bit_xor()?;
            left = Expr::Binary {
                op: BinaryOperator::BitOr,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bit_and()?;
        while self.peek() == &TokenKind::Caret {
            let line = self.line();
            self.bump();
            let right = self.parse_bit_and()?;
            left = Expr::Binary {
                op: BinaryOperator::BitXor,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.peek() == &TokenKind::Amp {
            let line = self.line();
            self.bump();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinaryOperator::BitAnd,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOperator::Eq,
                TokenKind::NotEq => BinaryOperator::Neq,
                _ => return Ok(left),
            };
            let line = self.line();
            self.bump();
            let right = self.parse_relational()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOperator::Lt,
                TokenKind::Gt => BinaryOperator::Gt,
                TokenKind::Le => BinaryOperator::Le,
                TokenKind::Ge => BinaryOperator::Ge,
                _ => return Ok(left),
            };
            let line = self.line();
            self.bump();
            let right = self.parse_additive()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            let line = self.line();
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => return Ok(left),
            };
            let line = self.line();
            self.bump();
            let right = self.parse_unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let op = match self.peek() {
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Star => UnaryOperator::Deref,
            TokenKind::Amp => UnaryOperator::AddressOf,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.peek() == &TokenKind::PlusPlus;
                self.bump();
                let target = self.parse_unary()?;
                return Ok(Expr::IncDec {
                    target: Box::new(target),
                    increment,
                    postfix: false,
                    line,
                });
            }
            _ => return self.parse_postfix(),
        };
        self.bump();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand), line })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let line = self.line();
            match self.peek() {
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { base: Box::new(expr), index: Box::new(index), line };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let increment = self.peek() == &TokenKind::PlusPlus;
                    self.bump();
                    expr = Expr::IncDec {
                        target: Box::new(expr),
                        increment,
                        postfix: true,
                        line,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        match self.peek().clone() {
            TokenKind::IntLit(value) => {
                self.bump();
                Ok(Expr::IntLit { value, line })
            }
            TokenKind::KwTrue => {
                self.bump();
                Ok(Expr::IntLit { value: 1, line })
            }
            TokenKind::KwFalse => {
                self.bump();
                Ok(Expr::IntLit { value: 0, line })
            }
            TokenKind::StrLit(value) => {
                self.bump();
                Ok(Expr::StrLit { value, line })
            }
            TokenKind::Ident(name) => {
                if self.peek_at(1) == &TokenKind::LParen {
                    self.bump();
                    self.bump();
                    let mut args = Vec::new();
                    if !self.eat(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assignment()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(TokenKind::RParen)?;
                    }
                    Ok(Expr::Call { name, args, line })
                } else {
                    self.bump();
                    Ok(Expr::Var { name, line })
                }
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            other => Err(ParseError::new(
                format!("expected an expression but found {}", other.describe()),
                line,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_program() {
        let program = parse_program("int main() { return 2 + 3 * 4; }").unwrap();
        assert_eq!(program.functions.len(), 1);
        let main = &program.functions[0];
        assert_eq!(main.name, "main");
        assert!(main.params.is_empty());
        assert_eq!(main.body.statements.len(), 1);

        // Precedence: the addition is outermost.
        match &main.body.statements[0] {
            Stmt::Return { value: Some(Expr::Binary { op, .. }), .. } => {
                assert_eq!(*op, BinaryOperator::Add);
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn parses_parameters_and_pointer_types() {
        let program = parse_program("int* f(int x, char** p) { return x; }").unwrap();
        let f = &program.functions[0];
        assert_eq!(f.return_ty, TyExpr { name: "int".to_string(), pointer_depth: 1 });
        assert_eq!(f.params[1].ty, TyExpr { name: "char".to_string(), pointer_depth: 2 });
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse_program("int f() { a = b = 1; }").unwrap();
        match &program.functions[0].body.statements[0] {
            Stmt::Expr(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn single_statement_bodies_become_blocks() {
        let program =
            parse_program("int f(int x) { if (x > 0) return x; else x++; while (x) x--; }")
                .unwrap();
        let statements = &program.functions[0].body.statements;
        match &statements[0] {
            Stmt::If { then_branch, else_branch, .. } => {
                assert_eq!(then_branch.statements.len(), 1);
                assert_eq!(else_branch.as_ref().unwrap().statements.len(), 1);
            }
            other => panic!("unexpected statement {other:?}"),
        }
        assert!(matches!(&statements[1], Stmt::While { .. }));
    }

    #[test]
    fn dangling_tokens_are_rejected() {
        assert!(parse_program("int main() { return 1 }").is_err());
        assert!(parse_program("int main() { ").is_err());
        assert!(parse_program("int main() { return $; }").is_err());
    }
}
