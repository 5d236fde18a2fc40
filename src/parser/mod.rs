//! Recursive-descent parser for statements, and a metadata-driven
//! precedence climber for expressions (the table in `PRECEDENCE`).
mod precedence;

use log::debug;

use crate::ast::expression::{Binary, Call, Unary};
use crate::ast::statement::{Compound, For, FunctionDef, If, Return, VarDef, While};
use crate::ast::{Expression, Statement};
use crate::diagnostics::{EngineError, TokenDesc};
use crate::lexer::{Token, TokenKind};

use precedence::{Associativity, PRECEDENCE};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type ParseResult<T> = Result<T, EngineError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_program(mut self) -> ParseResult<Statement> {
        debug!("parsing {} tokens into a program", self.tokens.len());
        let mut statements = Vec::new();
        while !self.check(TokenKind::EndOfSource) {
            statements.push(self.parse_statement()?);
        }
        debug!("parsed {} top-level statements", statements.len());
        Ok(Statement::Compound(Compound::new(statements)))
    }

    // --- token stream plumbing ------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(EngineError::ExpectedToken {
                expected: kind,
                got: self.describe(self.peek()),
            })
        }
    }

    fn describe(&self, token: &Token) -> TokenDesc {
        TokenDesc {
            kind: token.kind,
            text: token.text.clone(),
            position: token.position,
        }
    }

    // --- statements ------------------------------------------------------------

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek().kind {
            TokenKind::LBrace => Ok(Statement::Compound(self.parse_block()?)),
            TokenKind::Function => self.parse_function_def(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Var => self.parse_var_def(),
            TokenKind::Return => self.parse_return(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> ParseResult<Compound> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Compound::new(statements))
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Box::new(self.parse_statement()?)
        } else {
            Box::new(Statement::Compound(Compound::empty()))
        };
        Ok(Statement::If(If {
            condition,
            then_branch,
            else_branch,
        }))
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_expression()?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(While { condition, body }))
    }

    fn parse_for(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::For)?;
        let counter = self.expect(TokenKind::Identifier)?;
        let from = self.parse_expression()?;
        self.expect(TokenKind::Comma)?;
        let to = self.parse_expression()?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(For {
            counter,
            from,
            to,
            body,
        }))
    }

    fn parse_var_def(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Var)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::VarDef(VarDef { name, value }))
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Return(Return { keyword, value }))
    }

    fn parse_function_def(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Function)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Identifier)?;
                params.push(param.text);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = Box::new(Statement::Compound(self.parse_block()?));
        Ok(Statement::FunctionDef(FunctionDef { name, params, body }))
    }

    // --- expressions -------------------------------------------------------

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary(0)
    }

    /// `level` indexes into `PRECEDENCE`; past the table's end, defer to
    /// prefix parsing. Left-associative levels loop, re-entering at
    /// `level + 1`; right-associative levels recurse once, re-entering at
    /// `level` itself so `a = b = c` folds as `a = (b = c)`.
    fn parse_binary(&mut self, level: usize) -> ParseResult<Expression> {
        let Some((assoc, ops)) = PRECEDENCE.get(level) else {
            return self.parse_prefix();
        };

        let mut left = self.parse_binary(level + 1)?;

        match assoc {
            Associativity::Left => {
                while ops.contains(&self.peek().kind) {
                    let op = self.advance();
                    let right = self.parse_binary(level + 1)?;
                    left = Expression::Binary(Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                Ok(left)
            }
            Associativity::Right => {
                if ops.contains(&self.peek().kind) {
                    let op = self.advance();
                    let right = self.parse_binary(level)?;
                    left = Expression::Binary(Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                Ok(left)
            }
        }
    }

    fn parse_prefix(&mut self) -> ParseResult<Expression> {
        if matches!(
            self.peek().kind,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Bang
        ) {
            let op = self.advance();
            let expr = Box::new(self.parse_prefix()?);
            Ok(Expression::Unary(Unary { op, expr }))
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_atomic()?;
        while self.check(TokenKind::LParen) {
            let open = self.advance();
            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    args.push(self.parse_expression()?);
                    if self.check(TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen)?;
            expr = Expression::Call(Call {
                callee: Box::new(expr),
                args,
                position: open.position,
            });
        }
        Ok(expr)
    }

    fn parse_atomic(&mut self) -> ParseResult<Expression> {
        match self.peek().kind {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Identifier => Ok(Expression::Var(self.advance())),
            TokenKind::Integer => Ok(Expression::IntLit(self.advance())),
            TokenKind::String => Ok(Expression::StringLit(self.advance())),
            TokenKind::True | TokenKind::False => Ok(Expression::BoolLit(self.advance())),
            _ => Err(EngineError::UnexpectedToken {
                got: self.describe(self.peek()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Statement {
        let (tokens, _) = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse_program().unwrap()
    }

    fn only_expr(program: &Statement) -> &Expression {
        let Statement::Compound(compound) = program else {
            panic!("expected compound")
        };
        let Statement::Expr(expr) = &compound.statements[0] else {
            panic!("expected expression statement")
        };
        expr
    }

    #[test]
    fn subtraction_is_left_associative() {
        let program = parse("1 - 2 - 3;");
        let Expression::Binary(outer) = only_expr(&program) else {
            panic!("expected binary")
        };
        assert_eq!(outer.op.kind, TokenKind::Minus);
        let Expression::Binary(inner) = outer.left.as_ref() else {
            panic!("expected nested binary on the left")
        };
        assert_eq!(inner.op.kind, TokenKind::Minus);
        assert!(matches!(outer.right.as_ref(), Expression::IntLit(_)));
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse("a = b = c;");
        let Expression::Binary(outer) = only_expr(&program) else {
            panic!("expected binary")
        };
        assert_eq!(outer.op.kind, TokenKind::Assign);
        assert!(matches!(outer.left.as_ref(), Expression::Var(_)));
        assert!(matches!(outer.right.as_ref(), Expression::Binary(_)));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse("1 + 2 * 3;");
        let Expression::Binary(outer) = only_expr(&program) else {
            panic!("expected binary")
        };
        assert_eq!(outer.op.kind, TokenKind::Plus);
        assert!(matches!(outer.right.as_ref(), Expression::Binary(_)));
    }

    #[test]
    fn missing_else_is_empty_compound_not_null() {
        let (tokens, _) = Lexer::new("if true { }").tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let Statement::Compound(compound) = program else {
            panic!("expected compound")
        };
        let Statement::If(if_stmt) = &compound.statements[0] else {
            panic!("expected if")
        };
        let Statement::Compound(else_branch) = if_stmt.else_branch.as_ref() else {
            panic!("expected compound else branch")
        };
        assert!(else_branch.statements.is_empty());
    }

    #[test]
    fn unexpected_token_is_reported() {
        let (tokens, _) = Lexer::new("var x = ;").tokenize().unwrap();
        let err = Parser::new(tokens).parse_program().unwrap_err();
        assert!(matches!(err, EngineError::UnexpectedToken { .. }));
    }
}
