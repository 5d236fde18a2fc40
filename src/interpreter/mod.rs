//! Tree-walking interpreter: executes the desugared AST directly
//! against a `SymbolTable`. `return` unwinds via the `StepResult` sum
//! type rather than a host exception (§9 design note), caught at every
//! call boundary.
use std::rc::Rc;
use std::str::FromStr;

use log::trace;
use num_bigint::BigInt;

use crate::ast::statement::Compound;
use crate::ast::{Expression, Statement};
use crate::diagnostics::EngineError;
use crate::lexer::TokenKind;
use crate::native;
use crate::position::Position;
use crate::strings::unescape_literal;
use crate::symtab::SymbolTable;
use crate::value::{self, Value};

/// Normal completion, or a `return` unwinding toward its call frame.
enum StepResult {
    Normal,
    Returned(Value),
}

pub struct Interpreter {
    symbols: SymbolTable,
}

impl Interpreter {
    pub fn new() -> Result<Self, EngineError> {
        let mut symbols = SymbolTable::new();
        native::register(&mut symbols)?;
        Ok(Self { symbols })
    }

    /// Runs a desugared program. The program's own top-level compound
    /// shares the global scope rather than opening a child of it.
    pub fn run(&mut self, program: &Statement) -> Result<(), EngineError> {
        match program {
            Statement::Compound(compound) => {
                self.execute_compound(compound, true)?;
            }
            other => {
                self.execute(other)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Statement) -> Result<StepResult, EngineError> {
        match statement {
            Statement::Compound(compound) => self.execute_compound(compound, false),
            Statement::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(StepResult::Normal)
            }
            Statement::VarDef(var_def) => {
                let value = self.evaluate(&var_def.value)?;
                self.symbols
                    .define(&var_def.name.text, value, true, var_def.name.position)?;
                Ok(StepResult::Normal)
            }
            Statement::If(if_stmt) => {
                let condition = self.evaluate(&if_stmt.condition)?;
                if condition.as_bool(if_stmt.condition.position())? {
                    self.execute(&if_stmt.then_branch)
                } else {
                    self.execute(&if_stmt.else_branch)
                }
            }
            Statement::While(while_stmt) => {
                loop {
                    let condition = self.evaluate(&while_stmt.condition)?;
                    if !condition.as_bool(while_stmt.condition.position())? {
                        break;
                    }
                    match self.execute(&while_stmt.body)? {
                        StepResult::Normal => {}
                        returned @ StepResult::Returned(_) => return Ok(returned),
                    }
                }
                Ok(StepResult::Normal)
            }
            Statement::FunctionDef(function_def) => {
                let value = Value::Function(Rc::new(function_def.clone()));
                self.symbols
                    .define(&function_def.name.text, value, false, function_def.name.position)?;
                Ok(StepResult::Normal)
            }
            Statement::Return(return_stmt) => {
                let value = match &return_stmt.value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Void,
                };
                Ok(StepResult::Returned(value))
            }
            Statement::For(_) => {
                unreachable!("the desugarer eliminates every `for` node before execution")
            }
        }
    }

    fn execute_compound(
        &mut self,
        compound: &Compound,
        suppress_scope: bool,
    ) -> Result<StepResult, EngineError> {
        if !suppress_scope {
            self.symbols.enter_scope();
        }
        let mut result = StepResult::Normal;
        for statement in &compound.statements {
            result = self.execute(statement)?;
            if matches!(result, StepResult::Returned(_)) {
                break;
            }
        }
        if !suppress_scope {
            self.symbols.exit_scope();
        }
        Ok(result)
    }

    /// A function body is a `Compound`; it shares its call frame's scope
    /// the same way the program body shares the global scope.
    fn execute_function_body(&mut self, body: &Statement) -> Result<StepResult, EngineError> {
        match body {
            Statement::Compound(compound) => self.execute_compound(compound, true),
            other => self.execute(other),
        }
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Value, EngineError> {
        match expr {
            Expression::IntLit(token) => {
                let n = BigInt::from_str(&token.text).map_err(|_| EngineError::Runtime {
                    message: format!("'{}' is not a valid integer literal", token.text),
                    position: token.position,
                })?;
                Ok(Value::Integer(n))
            }
            Expression::BoolLit(token) => Ok(Value::Bool(token.kind == TokenKind::True)),
            Expression::StringLit(token) => {
                Ok(Value::String(Rc::new(unescape_literal(&token.text))))
            }
            Expression::Var(token) => {
                let symbol = self.symbols.lookup(&token.text, token.position)?;
                Ok(symbol.value().clone())
            }
            Expression::Unary(unary) => {
                let operand = self.evaluate(&unary.expr)?;
                match unary.op.kind {
                    TokenKind::Plus => value::pos(&operand, unary.op.position),
                    TokenKind::Minus => value::neg(&operand, unary.op.position),
                    TokenKind::Bang => value::not(&operand, unary.op.position),
                    _ => unreachable!("parser only produces +/-/! as unary operators"),
                }
            }
            Expression::Binary(binary) => self.evaluate_binary(binary),
            Expression::Call(call) => self.evaluate_call(call),
        }
    }

    fn evaluate_binary(&mut self, binary: &crate::ast::expression::Binary) -> Result<Value, EngineError> {
        match binary.op.kind {
            TokenKind::Assign => {
                let Expression::Var(name) = binary.left.as_ref() else {
                    return Err(EngineError::Runtime {
                        message: "assignment target must be a variable".to_owned(),
                        position: binary.left.position(),
                    });
                };
                let value = self.evaluate(&binary.right)?;
                self.symbols.assign(&name.text, value.clone(), binary.op.position)?;
                Ok(value)
            }
            TokenKind::AndAnd => {
                let left = self.evaluate(&binary.left)?;
                if !left.as_bool(binary.left.position())? {
                    return Ok(Value::Bool(false));
                }
                let right = self.evaluate(&binary.right)?;
                Ok(Value::Bool(right.as_bool(binary.right.position())?))
            }
            TokenKind::OrOr => {
                let left = self.evaluate(&binary.left)?;
                if left.as_bool(binary.left.position())? {
                    return Ok(Value::Bool(true));
                }
                let right = self.evaluate(&binary.right)?;
                Ok(Value::Bool(right.as_bool(binary.right.position())?))
            }
            _ => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                let position = binary.op.position;
                match binary.op.kind {
                    TokenKind::Plus => value::add(&left, &right, position),
                    TokenKind::Minus => value::sub(&left, &right, position),
                    TokenKind::Star => value::mul(&left, &right, position),
                    TokenKind::Slash => value::div(&left, &right, position),
                    TokenKind::Percent => value::modulo(&left, &right, position),
                    TokenKind::Greater => value::greater(&left, &right, position),
                    TokenKind::GreaterEq => value::greater_eq(&left, &right, position),
                    TokenKind::Less => value::less(&left, &right, position),
                    TokenKind::LessEq => value::less_eq(&left, &right, position),
                    TokenKind::EqEq => value::eq(&left, &right, position),
                    TokenKind::NotEq => value::not_eq(&left, &right, position),
                    _ => unreachable!("desugaring removes every other binary operator kind"),
                }
            }
        }
    }

    fn evaluate_call(&mut self, call: &crate::ast::expression::Call) -> Result<Value, EngineError> {
        let callee = self.evaluate(&call.callee)?;
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.evaluate(arg)?);
        }

        match callee {
            Value::Function(def) => {
                if def.params.len() != args.len() {
                    return Err(EngineError::Runtime {
                        message: format!(
                            "'{}' expects {} argument(s) but got {}",
                            def.name.text,
                            def.params.len(),
                            args.len()
                        ),
                        position: call.position,
                    });
                }

                trace!("calling function '{}' across the call boundary", def.name.text);
                let saved = self.symbols.begin_call();
                let outcome = (|| -> Result<StepResult, EngineError> {
                    for (param, arg) in def.params.iter().zip(args) {
                        self.symbols.define(param, arg, true, call.position)?;
                    }
                    self.execute_function_body(&def.body)
                })();
                self.symbols.end_call(saved);

                match outcome? {
                    StepResult::Returned(value) => Ok(value),
                    StepResult::Normal => Ok(Value::Void),
                }
            }
            Value::NativeFunction(f) => {
                trace!("calling a native function across the call boundary");
                f(&args)
            }
            _ => Err(EngineError::Runtime {
                message: "not callable".to_owned(),
                position: call.position,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desugar::desugar_program;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compound_value_of(source: &str, var_name: &str) -> Value {
        let (tokens, _) = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let program = desugar_program(program).unwrap();
        let mut interpreter = Interpreter::new().unwrap();
        interpreter.run(&program).unwrap();
        interpreter.symbols.lookup(var_name, Position::new(0, 0)).unwrap().value().clone()
    }

    #[test]
    fn compound_assignment_mutates_variable() {
        let value = compound_value_of("var x = 1; x += 2; x *= 3;", "x");
        assert_eq!(value.display_for_print(), "9");
    }

    #[test]
    fn precedence_matches_arithmetic_expectation() {
        let value = compound_value_of("var x = 1 + 2 * 3;", "x");
        assert_eq!(value.display_for_print(), "7");
    }

    #[test]
    fn for_loop_counts_up_and_down() {
        assert_eq!(compound_value_of("var x = 0; for i 0, 3 { x = x + i; }", "x").display_for_print(), "3");
        assert_eq!(compound_value_of("var x = 0; for i 3, 0 { x = x + i; }", "x").display_for_print(), "6");
    }

    #[test]
    fn inner_block_variable_does_not_leak() {
        let (tokens, _) = Lexer::new("{ var y = 1; }").tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let program = desugar_program(program).unwrap();
        let mut interpreter = Interpreter::new().unwrap();
        interpreter.run(&program).unwrap();
        assert!(interpreter.symbols.lookup("y", Position::new(0, 0)).is_err());
    }

    #[test]
    fn function_call_does_not_see_callers_locals() {
        let source = "var secret = 1; function f() { return secret; } var r = 0; r = f();";
        let (tokens, _) = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let program = desugar_program(program).unwrap();
        let mut interpreter = Interpreter::new().unwrap();
        let err = interpreter.run(&program).unwrap_err();
        assert!(matches!(err, EngineError::SymbolNotFound { .. }));
    }

    #[test]
    fn return_from_nested_while_unwinds_to_call_site() {
        let source = "function first_even(n) { var i = 0; while i < n { if i % 2 == 0 { return i; } i += 1; } return -1; } var r = first_even(5);";
        let value = compound_value_of(source, "r");
        assert_eq!(value.display_for_print(), "0");
    }
}
