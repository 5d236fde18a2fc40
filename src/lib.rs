//! Front-end and dual execution engine for a small, dynamically-typed
//! scripting language: lexer → parser → desugarer, then either a
//! tree-walking interpreter or a bytecode compiler + stack VM. The
//! five stages share the token/AST data model (`ast`), the runtime
//! value model (`value`), and the symbol table (`symtab`).
pub mod ast;
pub mod compiler;
pub mod desugar;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod native;
pub mod parser;
pub mod position;
pub mod strings;
pub mod symtab;
pub mod value;
pub mod vm;

use std::rc::Rc;

use ast::Statement;
use diagnostics::EngineError;
use position::SourceCursor;

/// Runs the lexer, parser, and desugarer over `source`. The cursor is
/// returned alongside the result, not nested inside it, so a lex-time
/// failure still carries a cursor a caller can format a diagnostic
/// against.
pub fn prepare(source: &str) -> (Result<Statement, EngineError>, Rc<SourceCursor>) {
    let lexer = lexer::Lexer::new(source);
    let cursor = lexer.cursor();
    let result = lexer
        .tokenize()
        .and_then(|(tokens, _)| parser::Parser::new(tokens).parse_program())
        .and_then(desugar::desugar_program);
    (result, cursor)
}

/// Which back-end `run_source` should execute the prepared program on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Interpreter,
    Vm,
}

/// Prepares and runs `source` end to end, returning the cursor so the
/// caller can render any error via `diagnostics::DiagnosticFormatter`.
pub fn run_source(source: &str, engine: Engine) -> (Result<(), EngineError>, Rc<SourceCursor>) {
    let (prepared, cursor) = prepare(source);
    let result = prepared.and_then(|program| match engine {
        Engine::Interpreter => interpreter::Interpreter::new()?.run(&program),
        Engine::Vm => {
            let bytecode = compiler::Compiler::compile(&program)?;
            vm::Vm::new(bytecode).run()
        }
    });
    (result, cursor)
}
