//! Pure AST→AST rewrite pass: eliminates compound-assignment operators
//! and `for` loops, leaving only the core forms either execution engine
//! understands. Runs once between parsing and execution; leaves no
//! `For` node and no compound-assignment `Binary` behind.
use log::trace;

use crate::ast::expression::{Binary, Call, Unary};
use crate::ast::statement::{Compound, For, FunctionDef, If, Return, VarDef, While};
use crate::ast::{Expression, Statement};
use crate::diagnostics::EngineError;
use crate::lexer::{Token, TokenKind};

pub fn desugar_program(program: Statement) -> Result<Statement, EngineError> {
    trace!("desugaring program");
    let result = desugar_statement(program);
    trace!("desugaring done, ok = {}", result.is_ok());
    result
}

fn desugar_statement(statement: Statement) -> Result<Statement, EngineError> {
    match statement {
        Statement::Compound(compound) => {
            let statements = compound
                .statements
                .into_iter()
                .map(desugar_statement)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::Compound(Compound::new(statements)))
        }
        Statement::Expr(expr) => Ok(Statement::Expr(desugar_expression(expr)?)),
        Statement::VarDef(var_def) => Ok(Statement::VarDef(VarDef {
            name: var_def.name,
            value: desugar_expression(var_def.value)?,
        })),
        Statement::If(if_stmt) => Ok(Statement::If(If {
            condition: desugar_expression(if_stmt.condition)?,
            then_branch: Box::new(desugar_statement(*if_stmt.then_branch)?),
            else_branch: Box::new(desugar_statement(*if_stmt.else_branch)?),
        })),
        Statement::While(while_stmt) => Ok(Statement::While(While {
            condition: desugar_expression(while_stmt.condition)?,
            body: Box::new(desugar_statement(*while_stmt.body)?),
        })),
        Statement::FunctionDef(function_def) => Ok(Statement::FunctionDef(FunctionDef {
            name: function_def.name,
            params: function_def.params,
            body: Box::new(desugar_statement(*function_def.body)?),
        })),
        Statement::Return(return_stmt) => Ok(Statement::Return(Return {
            keyword: return_stmt.keyword,
            value: return_stmt.value.map(desugar_expression).transpose()?,
        })),
        Statement::For(for_stmt) => desugar_for(for_stmt),
    }
}

/// `for i a, b { body }` → the `for.from`/`for.to`-staged if/while pair
/// from §4.3. The auxiliary names carry a dot so user code can never
/// shadow them; the rewritten body is then desugared again so any
/// `+=`/`-=` it introduces (the step) expands too.
fn desugar_for(for_stmt: For) -> Result<Statement, EngineError> {
    let For {
        counter,
        from,
        to,
        body,
    } = for_stmt;

    let from_name = counter.synthesize(TokenKind::Identifier, "for.from");
    let to_name = counter.synthesize(TokenKind::Identifier, "for.to");

    let from_value = desugar_expression(from)?;
    let to_value = desugar_expression(to)?;
    let body = desugar_statement(*body)?;

    let def_from = Statement::VarDef(VarDef {
        name: from_name.clone(),
        value: from_value,
    });
    let def_to = Statement::VarDef(VarDef {
        name: to_name.clone(),
        value: to_value,
    });
    let def_counter = Statement::VarDef(VarDef {
        name: counter.clone(),
        value: Expression::Var(from_name.clone()),
    });

    let outer_condition = compare(&counter, TokenKind::LessEq, "<=", &to_name);

    let ascending = Statement::While(While {
        condition: compare(&counter, TokenKind::Less, "<", &to_name),
        body: Box::new(Statement::Compound(Compound::new(vec![
            body.clone(),
            step(&counter, true),
        ]))),
    });
    let descending = Statement::While(While {
        condition: compare(&counter, TokenKind::Greater, ">", &to_name),
        body: Box::new(Statement::Compound(Compound::new(vec![
            body,
            step(&counter, false),
        ]))),
    });

    let staged = Statement::If(If {
        condition: outer_condition,
        then_branch: Box::new(ascending),
        else_branch: Box::new(descending),
    });

    Ok(Statement::Compound(Compound::new(vec![
        def_from,
        def_to,
        def_counter,
        staged,
    ])))
}

fn compare(counter: &Token, op_kind: TokenKind, op_text: &str, bound: &Token) -> Expression {
    Expression::Binary(Binary {
        op: counter.synthesize(op_kind, op_text),
        left: Box::new(Expression::Var(counter.clone())),
        right: Box::new(Expression::Var(bound.clone())),
    })
}

/// `i = i + 1` (or `- 1`), already in core form so it needs no further
/// desugaring of its own.
fn step(counter: &Token, ascending: bool) -> Statement {
    let (op_kind, op_text) = if ascending {
        (TokenKind::Plus, "+")
    } else {
        (TokenKind::Minus, "-")
    };
    let increment = Expression::Binary(Binary {
        op: counter.synthesize(op_kind, op_text),
        left: Box::new(Expression::Var(counter.clone())),
        right: Box::new(Expression::IntLit(counter.synthesize(TokenKind::Integer, "1"))),
    });
    let assign = Expression::Binary(Binary {
        op: counter.synthesize(TokenKind::Assign, "="),
        left: Box::new(Expression::Var(counter.clone())),
        right: Box::new(increment),
    });
    Statement::Expr(assign)
}

fn desugar_expression(expr: Expression) -> Result<Expression, EngineError> {
    match expr {
        Expression::IntLit(_) | Expression::BoolLit(_) | Expression::StringLit(_) | Expression::Var(_) => {
            Ok(expr)
        }
        Expression::Unary(unary) => Ok(Expression::Unary(Unary {
            op: unary.op,
            expr: Box::new(desugar_expression(*unary.expr)?),
        })),
        Expression::Call(call) => Ok(Expression::Call(Call {
            callee: Box::new(desugar_expression(*call.callee)?),
            args: call
                .args
                .into_iter()
                .map(desugar_expression)
                .collect::<Result<Vec<_>, _>>()?,
            position: call.position,
        })),
        Expression::Binary(binary) => desugar_binary(binary),
    }
}

/// `x ⊛= y` → `x = x ⊛ y`. The left operand is duplicated syntactically,
/// so only a bare `Var` is accepted as the target (§4.3).
fn desugar_binary(binary: Binary) -> Result<Expression, EngineError> {
    let left = desugar_expression(*binary.left)?;
    let right = desugar_expression(*binary.right)?;

    let Some(base_op) = compound_base(binary.op.kind) else {
        return Ok(Expression::Binary(Binary {
            op: binary.op,
            left: Box::new(left),
            right: Box::new(right),
        }));
    };

    if !left.is_var() {
        return Err(EngineError::Runtime {
            message: "left-hand side of a compound assignment must be a variable".to_owned(),
            position: left.position(),
        });
    }

    let rewritten_right = Expression::Binary(Binary {
        op: binary.op.synthesize(base_op, base_op_text(base_op)),
        left: Box::new(left.clone()),
        right: Box::new(right),
    });

    Ok(Expression::Binary(Binary {
        op: binary.op.synthesize(TokenKind::Assign, "="),
        left: Box::new(left),
        right: Box::new(rewritten_right),
    }))
}

fn compound_base(kind: TokenKind) -> Option<TokenKind> {
    match kind {
        TokenKind::PlusEq => Some(TokenKind::Plus),
        TokenKind::MinusEq => Some(TokenKind::Minus),
        TokenKind::StarEq => Some(TokenKind::Star),
        TokenKind::SlashEq => Some(TokenKind::Slash),
        TokenKind::PercentEq => Some(TokenKind::Percent),
        _ => None,
    }
}

fn base_op_text(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        _ => unreachable!("compound_base only yields arithmetic kinds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn desugar(source: &str) -> Statement {
        let (tokens, _) = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        desugar_program(program).unwrap()
    }

    fn only_statement(program: &Statement) -> &Statement {
        let Statement::Compound(compound) = program else {
            panic!("expected compound")
        };
        &compound.statements[0]
    }

    #[test]
    fn compound_assignment_rewrites_to_plain_assignment_of_binary() {
        let program = desugar("x += 1;");
        let Statement::Expr(Expression::Binary(assign)) = only_statement(&program) else {
            panic!("expected assignment expression statement")
        };
        assert_eq!(assign.op.kind, TokenKind::Assign);
        assert!(assign.left.is_var());
        let Expression::Binary(rhs) = assign.right.as_ref() else {
            panic!("expected binary rhs")
        };
        assert_eq!(rhs.op.kind, TokenKind::Plus);
    }

    #[test]
    fn compound_assignment_rejects_non_variable_target() {
        let (tokens, _) = Lexer::new("f() += 1;").tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        assert!(desugar_program(program).is_err());
    }

    #[test]
    fn for_loop_desugars_to_staged_if_while() {
        let program = desugar("for i 0, 3 { print(i); }");
        let Statement::Compound(outer) = only_statement(&program) else {
            panic!("expected compound")
        };
        assert_eq!(outer.statements.len(), 4);
        assert!(matches!(outer.statements[3], Statement::If(_)));
        let Statement::If(if_stmt) = &outer.statements[3] else {
            unreachable!()
        };
        assert!(matches!(if_stmt.then_branch.as_ref(), Statement::While(_)));
        assert!(matches!(if_stmt.else_branch.as_ref(), Statement::While(_)));
    }

    #[test]
    fn desugaring_is_idempotent() {
        let program = desugar("for i 0, 3 { x += 1; }");
        let twice = desugar_program(program.clone()).unwrap();
        assert_eq!(format!("{:?}", program), format!("{:?}", twice));
    }
}
