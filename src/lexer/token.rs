use std::rc::{Rc, Weak};

use crate::position::{Position, SourceCursor};

/// The closed set of token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Integer,
    String,
    EndOfSource,

    // Keywords
    Function,
    If,
    Else,
    While,
    For,
    Var,
    Return,
    True,
    False,

    // Punctuation
    Comma,
    Semicolon,
    LBrace,
    RBrace,
    LParen,
    RParen,

    // Relational
    Greater,
    GreaterEq,
    Less,
    LessEq,
    EqEq,
    NotEq,

    // Assignment
    Assign,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Logical
    Bang,
    AndAnd,
    OrOr,

    // Compound assignment
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
}

/// A single lexical unit: its kind, the exact matched substring, its
/// position, and a weak back-reference to the source used only for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    pub source: Weak<SourceCursor>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position, source: &Rc<SourceCursor>) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            source: Rc::downgrade(source),
        }
    }

    /// Synthesize a new token reusing `position`. Used by the desugarer
    /// when it splits a compound-assignment token into its two halves.
    pub fn synthesize(&self, kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            position: self.position,
            source: self.source.clone(),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}
