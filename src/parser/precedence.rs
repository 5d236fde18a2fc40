//! The binary operator precedence table, low to high. Each level names
//! its associativity and the token kinds that bind at it; the climber
//! in `super::Parser::parse_binary` walks the table by index instead of
//! special-casing each operator.
use crate::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

pub static PRECEDENCE: &[(Associativity, &[TokenKind])] = &[
    (
        Associativity::Right,
        &[
            TokenKind::Assign,
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::StarEq,
            TokenKind::SlashEq,
            TokenKind::PercentEq,
        ],
    ),
    (Associativity::Left, &[TokenKind::OrOr]),
    (Associativity::Left, &[TokenKind::AndAnd]),
    (Associativity::Left, &[TokenKind::EqEq, TokenKind::NotEq]),
    (
        Associativity::Left,
        &[
            TokenKind::Greater,
            TokenKind::GreaterEq,
            TokenKind::Less,
            TokenKind::LessEq,
        ],
    ),
    (Associativity::Left, &[TokenKind::Plus, TokenKind::Minus]),
    (
        Associativity::Left,
        &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
    ),
];
