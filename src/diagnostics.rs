//! Error kinds shared by every phase, and the caret-based formatter used to
//! render them against source text.
use std::fmt::Display;
use std::rc::Rc;

use crate::lexer::TokenKind;
use crate::position::{Position, SourceCursor};
use crate::value::Kind;

/// Every failure the engine can surface, closed per the language contract:
/// lexer and parser errors are always fatal, as are the runtime errors
/// raised by either execution engine.
#[derive(Debug, Clone)]
pub enum EngineError {
    UnknownCharacter { ch: char, position: Position },
    ExpectedToken { expected: TokenKind, got: TokenDesc },
    UnexpectedToken { got: TokenDesc },
    SymbolNotFound { name: String, position: Position },
    TypeError {
        expected: Kind,
        got: Kind,
        position: Position,
    },
    Runtime { message: String, position: Position },
}

/// A lightweight description of a token used purely for error reporting, so
/// diagnostics do not need to keep a whole `Token` alive.
#[derive(Debug, Clone)]
pub struct TokenDesc {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl EngineError {
    pub fn position(&self) -> Position {
        match self {
            EngineError::UnknownCharacter { position, .. } => *position,
            EngineError::ExpectedToken { got, .. } => got.position,
            EngineError::UnexpectedToken { got } => got.position,
            EngineError::SymbolNotFound { position, .. } => *position,
            EngineError::TypeError { position, .. } => *position,
            EngineError::Runtime { position, .. } => *position,
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownCharacter { ch, position } => {
                write!(f, "Error: unknown character '{ch}' at {position}")
            }
            EngineError::ExpectedToken { expected, got } => write!(
                f,
                "Error: expected {expected:?} but found {:?} ('{}') at {}",
                got.kind, got.text, got.position
            ),
            EngineError::UnexpectedToken { got } => write!(
                f,
                "Error: unexpected token {:?} ('{}') at {}",
                got.kind, got.text, got.position
            ),
            EngineError::SymbolNotFound { name, position } => write!(
                f,
                "Error: no such symbol '{name}' referenced at {position}"
            ),
            EngineError::TypeError {
                expected,
                got,
                position,
            } => write!(
                f,
                "Error: expected value of kind {expected:?} but got {got:?} at {position}"
            ),
            EngineError::Runtime { message, position } => {
                write!(f, "Error: {message} at {position}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Annotates a source line with an underline of `_` characters and a `^`
/// pointing at the offending column.
pub struct DiagnosticFormatter {
    cursor: Rc<SourceCursor>,
}

impl DiagnosticFormatter {
    pub fn new(cursor: Rc<SourceCursor>) -> Self {
        Self { cursor }
    }

    pub fn format(&self, error: &EngineError) -> String {
        let position = error.position();
        let line = self.cursor.line(position);
        let underline: String = "_".repeat(position.character);
        format!("{error}\n{line}\n{underline}^")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_symbol_not_found_with_caret() {
        let cursor = Rc::new(SourceCursor::new("println(x);\n"));
        let formatter = DiagnosticFormatter::new(cursor);
        let error = EngineError::SymbolNotFound {
            name: "x".to_owned(),
            position: Position::new(0, 8),
        };
        let rendered = formatter.format(&error);
        assert_eq!(
            rendered,
            "Error: no such symbol 'x' referenced at line 1, character 9\nprintln(x);\n________^"
        );
    }
}
