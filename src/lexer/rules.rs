//! Data tables driving the lexer: keyword literals and the whitespace/
//! comment patterns it ignores. Kept as plain data so the tokenizer loop in
//! `mod.rs` stays a thin driver over the tables rather than a hand-written
//! cascade of `if` checks.
use once_cell::sync::Lazy;

use super::token::TokenKind;

/// Alphanumeric keywords, matched only after the lexer has consumed a full
/// identifier-shaped run (so `ifx` lexes as one identifier, not `if` + `x`).
pub static WORD_KEYWORDS: Lazy<Vec<(&'static str, TokenKind)>> = Lazy::new(|| {
    vec![
        ("function", TokenKind::Function),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("for", TokenKind::For),
        ("var", TokenKind::Var),
        ("return", TokenKind::Return),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
    ]
});

/// Punctuation and operator literals, sorted by descending text length and
/// then lexicographically, so `<=` is tried (and wins) before `<`, `!=`
/// before `!`, `&&` before `&`, and so on.
pub static SYMBOL_KEYWORDS: Lazy<Vec<(&'static str, TokenKind)>> = Lazy::new(|| {
    let mut symbols = vec![
        (",", TokenKind::Comma),
        (";", TokenKind::Semicolon),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        (">", TokenKind::Greater),
        (">=", TokenKind::GreaterEq),
        ("<", TokenKind::Less),
        ("<=", TokenKind::LessEq),
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::NotEq),
        ("=", TokenKind::Assign),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("!", TokenKind::Bang),
        ("&&", TokenKind::AndAnd),
        ("||", TokenKind::OrOr),
        ("+=", TokenKind::PlusEq),
        ("-=", TokenKind::MinusEq),
        ("*=", TokenKind::StarEq),
        ("/=", TokenKind::SlashEq),
        ("%=", TokenKind::PercentEq),
    ];
    symbols.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    symbols
});

/// True if `prefix` could still be extended into some symbol keyword, i.e.
/// some keyword literal starts with `prefix`. Drives the longest-match loop
/// in `Lexer::lex_symbol`.
pub fn can_extend(prefix: &str) -> bool {
    SYMBOL_KEYWORDS
        .iter()
        .any(|(literal, _)| literal.starts_with(prefix))
}

pub fn match_symbol(text: &str) -> Option<TokenKind> {
    SYMBOL_KEYWORDS
        .iter()
        .find(|(literal, _)| *literal == text)
        .map(|(_, kind)| *kind)
}

pub fn match_word(text: &str) -> Option<TokenKind> {
    WORD_KEYWORDS
        .iter()
        .find(|(literal, _)| *literal == text)
        .map(|(_, kind)| *kind)
}
