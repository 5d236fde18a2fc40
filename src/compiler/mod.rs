//! Bytecode compiler: lowers the desugared AST to a flat `Instr`
//! sequence plus a constant pool (§4.5). Shares `SymbolTable` with the
//! interpreter, but every symbol it defines carries a register index —
//! that index, and whether the defining scope is `global`, is all the
//! VM needs to tell `GLoad`/`GStore` from `Load`/`Store`.
pub mod opcode;

use std::rc::Rc;
use std::str::FromStr;

use log::trace;
use num_bigint::BigInt;

use crate::ast::expression::Binary;
use crate::ast::statement::{Compound, FunctionDef, If, Return, VarDef, While};
use crate::ast::{Expression, Statement};
use crate::diagnostics::EngineError;
use crate::lexer::TokenKind;
use crate::native;
use crate::position::Position;
use crate::strings::unescape_literal;
use crate::symtab::SymbolTable;

use opcode::{Bytecode, Constant, Instr};

const ORIGIN: Position = Position::new(0, 0);

pub struct Compiler {
    code: Vec<Instr>,
    positions: Vec<Position>,
    constants: Vec<Constant>,
    symbols: SymbolTable,
}

impl Compiler {
    fn new() -> Self {
        Self {
            code: Vec::new(),
            positions: Vec::new(),
            constants: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn compile(program: &Statement) -> Result<Bytecode, EngineError> {
        let mut compiler = Self::new();

        let galloc_at = compiler.emit(Instr::GAlloc(0), ORIGIN);
        compiler.register_natives()?;

        match program {
            Statement::Compound(compound) => compiler.compile_compound(compound, true)?,
            other => compiler.compile_statement(other)?,
        }
        compiler.emit(Instr::Return, ORIGIN);

        let global_count = compiler.symbols.symbol_count();
        compiler.patch(galloc_at, Instr::GAlloc(global_count));

        Ok(Bytecode {
            code: compiler.code,
            constants: compiler.constants,
            positions: compiler.positions,
        })
    }

    fn register_natives(&mut self) -> Result<(), EngineError> {
        for (name, f) in native::table() {
            let const_idx = self.constants.len();
            self.constants.push(Constant::Native(f));
            let slot = self.symbols.define_indexed(name, false, ORIGIN)?;
            self.emit(Instr::PushNative(const_idx), ORIGIN);
            self.emit(Instr::GStore(slot), ORIGIN);
        }
        Ok(())
    }

    fn emit(&mut self, instr: Instr, position: Position) -> usize {
        self.code.push(instr);
        self.positions.push(position);
        self.code.len() - 1
    }

    /// Rewrites the instruction at `at`, keeping its originally recorded
    /// position since patching only resolves a jump target, not which
    /// instruction occupies the slot.
    fn patch(&mut self, at: usize, instr: Instr) {
        trace!("patching instruction {at} to {instr:?}");
        self.code[at] = instr;
    }

    fn here(&self) -> usize {
        self.code.len()
    }

    // --- statements ----------------------------------------------------

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), EngineError> {
        match statement {
            Statement::Compound(compound) => self.compile_compound(compound, false),
            Statement::Expr(expr) => {
                let position = expr.position();
                self.compile_expression(expr)?;
                self.emit(Instr::Pop, position);
                Ok(())
            }
            Statement::VarDef(var_def) => self.compile_var_def(var_def),
            Statement::If(if_stmt) => self.compile_if(if_stmt),
            Statement::While(while_stmt) => self.compile_while(while_stmt),
            Statement::FunctionDef(function_def) => self.compile_function_def(function_def),
            Statement::Return(return_stmt) => self.compile_return(return_stmt),
            Statement::For(_) => {
                unreachable!("the desugarer eliminates every `for` node before compilation")
            }
        }
    }

    fn compile_compound(&mut self, compound: &Compound, suppress_scope: bool) -> Result<(), EngineError> {
        if !suppress_scope {
            self.symbols.enter_scope();
        }
        for statement in &compound.statements {
            self.compile_statement(statement)?;
        }
        if !suppress_scope {
            self.symbols.exit_scope();
        }
        Ok(())
    }

    fn compile_function_body(&mut self, body: &Statement) -> Result<(), EngineError> {
        match body {
            Statement::Compound(compound) => self.compile_compound(compound, true),
            other => self.compile_statement(other),
        }
    }

    fn compile_var_def(&mut self, var_def: &VarDef) -> Result<(), EngineError> {
        self.compile_expression(&var_def.value)?;
        let is_global = self.symbols.is_global_scope();
        let index = self
            .symbols
            .define_indexed(&var_def.name.text, true, var_def.name.position)?;
        self.emit(store(is_global, index), var_def.name.position);
        Ok(())
    }

    fn compile_if(&mut self, if_stmt: &If) -> Result<(), EngineError> {
        let position = if_stmt.condition.position();
        self.compile_expression(&if_stmt.condition)?;
        let jump_if_then = self.emit(Instr::JumpIf(0), position);
        let jump_to_else = self.emit(Instr::Jump(0), position);

        let then_addr = self.here();
        self.patch(jump_if_then, Instr::JumpIf(then_addr));
        self.compile_statement(&if_stmt.then_branch)?;
        let jump_to_end = self.emit(Instr::Jump(0), position);

        let else_addr = self.here();
        self.patch(jump_to_else, Instr::Jump(else_addr));
        self.compile_statement(&if_stmt.else_branch)?;

        let end_addr = self.here();
        self.patch(jump_to_end, Instr::Jump(end_addr));
        Ok(())
    }

    fn compile_while(&mut self, while_stmt: &While) -> Result<(), EngineError> {
        let position = while_stmt.condition.position();
        let jump_to_cond = self.emit(Instr::Jump(0), position);

        let body_addr = self.here();
        self.compile_statement(&while_stmt.body)?;

        let cond_addr = self.here();
        self.patch(jump_to_cond, Instr::Jump(cond_addr));
        self.compile_expression(&while_stmt.condition)?;
        self.emit(Instr::JumpIf(body_addr), position);
        Ok(())
    }

    /// Binds parameters in declaration order but emits their `Store`s in
    /// reverse, since the VM pushes call arguments back in original
    /// order — the last argument ends up on top, so the first `Store`
    /// after entry must claim the last parameter (§4.5/§4.7).
    fn compile_function_def(&mut self, function_def: &FunctionDef) -> Result<(), EngineError> {
        let position = function_def.name.position;
        let is_global = self.symbols.is_global_scope();
        let outer_slot =
            self.symbols
                .define_indexed(&function_def.name.text, false, position)?;

        let jump_past_body = self.emit(Instr::Jump(0), position);
        let func_addr = self.here();

        let saved = self.symbols.begin_call();
        let alloc_at = self.emit(Instr::Alloc(0), position);

        let outcome = (|| -> Result<(), EngineError> {
            let mut indices = Vec::with_capacity(function_def.params.len());
            for param in &function_def.params {
                indices.push(self.symbols.define_indexed(param, true, position)?);
            }
            for index in indices.into_iter().rev() {
                self.emit(Instr::Store(index), position);
            }
            self.compile_function_body(&function_def.body)?;
            self.emit(Instr::Return, position);
            Ok(())
        })();

        let local_count = self.symbols.symbol_count();
        self.symbols.end_call(saved);
        outcome?;

        self.patch(alloc_at, Instr::Alloc(local_count));
        let after_addr = self.here();
        self.patch(jump_past_body, Instr::Jump(after_addr));

        self.emit(
            Instr::PushFunc {
                address: func_addr,
                arity: function_def.params.len(),
                name: Rc::from(function_def.name.text.as_str()),
            },
            position,
        );
        self.emit(store(is_global, outer_slot), position);
        Ok(())
    }

    fn compile_return(&mut self, return_stmt: &Return) -> Result<(), EngineError> {
        if let Some(value) = &return_stmt.value {
            self.compile_expression(value)?;
        }
        self.emit(Instr::Return, return_stmt.keyword.position);
        Ok(())
    }

    // --- expressions -----------------------------------------------------

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), EngineError> {
        match expr {
            Expression::IntLit(token) => {
                let n = BigInt::from_str(&token.text).map_err(|_| EngineError::Runtime {
                    message: format!("'{}' is not a valid integer literal", token.text),
                    position: token.position,
                })?;
                self.emit(Instr::PushInt(n), token.position);
                Ok(())
            }
            Expression::BoolLit(token) => {
                self.emit(Instr::PushBool(token.kind == TokenKind::True), token.position);
                Ok(())
            }
            Expression::StringLit(token) => {
                let const_idx = self.constants.len();
                self.constants.push(Constant::String(unescape_literal(&token.text)));
                self.emit(Instr::PushStr(const_idx), token.position);
                Ok(())
            }
            Expression::Var(token) => {
                let symbol = self.symbols.lookup(&token.text, token.position)?;
                let index = symbol
                    .register_index()
                    .expect("the compiler always allocates a register index");
                let is_global = self.symbols.is_global(&token.text)?;
                self.emit(load(is_global, index), token.position);
                Ok(())
            }
            Expression::Unary(unary) => {
                self.compile_expression(&unary.expr)?;
                match unary.op.kind {
                    TokenKind::Plus => {}
                    TokenKind::Minus => {
                        self.emit(Instr::Neg, unary.op.position);
                    }
                    TokenKind::Bang => {
                        self.emit(Instr::Not, unary.op.position);
                    }
                    _ => unreachable!("parser only produces +/-/! as unary operators"),
                }
                Ok(())
            }
            Expression::Binary(binary) => self.compile_binary(binary),
            Expression::Call(call) => {
                self.compile_expression(&call.callee)?;
                for arg in &call.args {
                    self.compile_expression(arg)?;
                }
                self.emit(Instr::Call(call.args.len()), call.position);
                Ok(())
            }
        }
    }

    fn compile_binary(&mut self, binary: &Binary) -> Result<(), EngineError> {
        match binary.op.kind {
            TokenKind::Assign => self.compile_assign(binary),
            TokenKind::AndAnd => self.compile_and(binary),
            TokenKind::OrOr => self.compile_or(binary),
            _ => {
                self.compile_expression(&binary.left)?;
                self.compile_expression(&binary.right)?;
                let position = binary.op.position;
                match binary.op.kind {
                    TokenKind::Plus => {
                        self.emit(Instr::Add, position);
                    }
                    TokenKind::Minus => {
                        self.emit(Instr::Sub, position);
                    }
                    TokenKind::Star => {
                        self.emit(Instr::Mul, position);
                    }
                    TokenKind::Slash => {
                        self.emit(Instr::Div, position);
                    }
                    TokenKind::Percent => {
                        self.emit(Instr::Mod, position);
                    }
                    TokenKind::Less => {
                        self.emit(Instr::Less, position);
                    }
                    TokenKind::Greater => {
                        self.emit(Instr::Greater, position);
                    }
                    TokenKind::LessEq => {
                        self.emit(Instr::Greater, position);
                        self.emit(Instr::Not, position);
                    }
                    TokenKind::GreaterEq => {
                        self.emit(Instr::Less, position);
                        self.emit(Instr::Not, position);
                    }
                    TokenKind::EqEq => {
                        self.emit(Instr::Eq, position);
                    }
                    TokenKind::NotEq => {
                        self.emit(Instr::Eq, position);
                        self.emit(Instr::Not, position);
                    }
                    _ => unreachable!("desugaring removes every other binary operator kind"),
                }
                Ok(())
            }
        }
    }

    fn compile_assign(&mut self, binary: &Binary) -> Result<(), EngineError> {
        let Expression::Var(name) = binary.left.as_ref() else {
            return Err(EngineError::Runtime {
                message: "assignment target must be a variable".to_owned(),
                position: binary.left.position(),
            });
        };
        self.compile_expression(&binary.right)?;
        let symbol = self.symbols.lookup(&name.text, name.position)?;
        let index = symbol
            .register_index()
            .expect("the compiler always allocates a register index");
        let is_global = self.symbols.is_global(&name.text)?;
        self.emit(store(is_global, index), binary.op.position);
        self.emit(load(is_global, index), binary.op.position);
        Ok(())
    }

    /// `a && b`: push `a`; if true, fall through and evaluate `b`
    /// (leaving its value as the result); if false, skip straight to
    /// pushing `false`. Short-circuits the same way the interpreter does.
    fn compile_and(&mut self, binary: &Binary) -> Result<(), EngineError> {
        let position = binary.op.position;
        self.compile_expression(&binary.left)?;
        let jump_to_rhs = self.emit(Instr::JumpIf(0), position);
        self.emit(Instr::PushBool(false), position);
        let jump_to_end = self.emit(Instr::Jump(0), position);

        let rhs_addr = self.here();
        self.patch(jump_to_rhs, Instr::JumpIf(rhs_addr));
        self.compile_expression(&binary.right)?;

        let end_addr = self.here();
        self.patch(jump_to_end, Instr::Jump(end_addr));
        Ok(())
    }

    /// `a || b`: push `a`; if true, skip straight to pushing `true`; if
    /// false, fall through and evaluate `b`.
    fn compile_or(&mut self, binary: &Binary) -> Result<(), EngineError> {
        let position = binary.op.position;
        self.compile_expression(&binary.left)?;
        let jump_to_true = self.emit(Instr::JumpIf(0), position);
        self.compile_expression(&binary.right)?;
        let jump_to_end = self.emit(Instr::Jump(0), position);

        let true_addr = self.here();
        self.patch(jump_to_true, Instr::JumpIf(true_addr));
        self.emit(Instr::PushBool(true), position);

        let end_addr = self.here();
        self.patch(jump_to_end, Instr::Jump(end_addr));
        Ok(())
    }
}

fn store(is_global: bool, index: usize) -> Instr {
    if is_global {
        Instr::GStore(index)
    } else {
        Instr::Store(index)
    }
}

fn load(is_global: bool, index: usize) -> Instr {
    if is_global {
        Instr::GLoad(index)
    } else {
        Instr::Load(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desugar::desugar_program;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::vm::Vm;

    fn run(source: &str) -> Vm {
        let (tokens, _) = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let program = desugar_program(program).unwrap();
        let bytecode = Compiler::compile(&program).unwrap();
        let mut vm = Vm::new(bytecode);
        vm.run().unwrap();
        vm
    }

    // The four native functions (print, println, space, plot_x) claim
    // global slots 0..3 before any user global, per `register_natives`.
    const FIRST_USER_GLOBAL: usize = 4;

    #[test]
    fn globals_reflect_compound_assignment() {
        let vm = run("var x = 1; x += 2; x *= 3;");
        assert_eq!(vm.global_display(FIRST_USER_GLOBAL), "9");
    }

    #[test]
    fn precedence_matches_arithmetic_expectation() {
        let vm = run("var x = 1 + 2 * 3;");
        assert_eq!(vm.global_display(FIRST_USER_GLOBAL), "7");
    }

    #[test]
    fn short_circuit_and_or_match_interpreter_semantics() {
        let vm = run("var a = 1 < 2 && 3 < 4; var b = 1 > 2 || 3 < 4;");
        assert_eq!(vm.global_display(FIRST_USER_GLOBAL), "true");
        assert_eq!(vm.global_display(FIRST_USER_GLOBAL + 1), "true");
    }
}
