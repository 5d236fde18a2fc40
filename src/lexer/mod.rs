//! Rule-driven tokenizer: ignores, then word keywords, then symbol
//! keywords, then the three regex-shaped token classes (identifier,
//! integer, string), tried in that order at every cursor position.
mod rules;
mod token;

pub use token::{Token, TokenKind};

use std::rc::Rc;

use log::{debug, trace};

use crate::diagnostics::EngineError;
use crate::position::{Position, SourceCursor};

pub struct Lexer {
    cursor: Rc<SourceCursor>,
    chars: Vec<char>,
    idx: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let cursor = Rc::new(SourceCursor::new(source));
        let chars = cursor.text().chars().collect();
        Self {
            cursor,
            chars,
            idx: 0,
            line: 0,
            col: 0,
        }
    }

    pub fn cursor(&self) -> Rc<SourceCursor> {
        self.cursor.clone()
    }

    pub fn tokenize(mut self) -> Result<(Vec<Token>, Rc<SourceCursor>), EngineError> {
        trace!("tokenizing {} characters of source", self.chars.len());
        let mut tokens = Vec::new();
        loop {
            self.skip_ignores();

            let Some(c) = self.peek() else {
                let position = self.position();
                tokens.push(Token::new(TokenKind::EndOfSource, "", position, &self.cursor));
                break;
            };

            let token = match c {
                'A'..='Z' | 'a'..='z' | '_' => self.lex_identifier_or_word(),
                '0'..='9' => self.lex_integer(),
                '\'' => self.lex_string()?,
                _ => self.lex_symbol()?,
            };
            tokens.push(token);
        }
        debug!("tokenized into {} tokens", tokens.len());
        Ok((tokens, self.cursor))
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Ignore rule 1: whitespace. Ignore rule 2: line comments `// ... \n`.
    /// Retried at the cursor until neither matches, per the lex loop in the
    /// language contract.
    fn skip_ignores(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_identifier_or_word(&mut self) -> Token {
        let position = self.position();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = rules::match_word(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, position, &self.cursor)
    }

    fn lex_integer(&mut self) -> Token {
        let position = self.position();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Integer, text, position, &self.cursor)
    }

    /// `'(\.|[^'])*'` — single-quoted strings with backslash escapes kept
    /// verbatim in `text`; unescaping happens later, once, in the compiler
    /// and interpreter value conversion.
    fn lex_string(&mut self) -> Result<Token, EngineError> {
        let position = self.position();
        let mut text = String::from("'");
        self.advance();
        loop {
            match self.peek() {
                Some('\'') => {
                    text.push('\'');
                    self.advance();
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    if let Some(escaped) = self.peek() {
                        text.push(escaped);
                        self.advance();
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
                None => {
                    return Err(EngineError::UnknownCharacter {
                        ch: '\'',
                        position,
                    });
                }
            }
        }
        Ok(Token::new(TokenKind::String, text, position, &self.cursor))
    }

    /// Longest-match loop over `SYMBOL_KEYWORDS`: keep extending the run as
    /// long as some keyword could still match, then resolve the exact
    /// keyword once extending stops.
    fn lex_symbol(&mut self) -> Result<Token, EngineError> {
        let position = self.position();
        let mut text = String::new();
        loop {
            let Some(c) = self.peek() else { break };
            let mut candidate = text.clone();
            candidate.push(c);
            if rules::can_extend(&candidate) {
                text = candidate;
                self.advance();
            } else {
                break;
            }
        }

        match rules::match_symbol(&text) {
            Some(kind) => Ok(Token::new(kind, text, position, &self.cursor)),
            None => {
                let ch = text.chars().next().or_else(|| self.peek()).unwrap_or('\0');
                Err(EngineError::UnknownCharacter { ch, position })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .0
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("var x = 1;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Integer,
                TokenKind::Semicolon,
                TokenKind::EndOfSource,
            ]
        );
    }

    #[test]
    fn keyword_prefix_does_not_split_identifier() {
        assert_eq!(
            kinds("ifx"),
            vec![TokenKind::Identifier, TokenKind::EndOfSource]
        );
    }

    #[test]
    fn longest_match_wins_for_operators() {
        for (src, kind) in [
            ("<=", TokenKind::LessEq),
            (">=", TokenKind::GreaterEq),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("&&", TokenKind::AndAnd),
            ("||", TokenKind::OrOr),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
            ("%=", TokenKind::PercentEq),
        ] {
            assert_eq!(kinds(src), vec![kind, TokenKind::EndOfSource], "source: {src}");
        }
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        assert_eq!(
            kinds("// comment\n  var /* not a block comment */ x;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::EndOfSource,
            ]
        );
    }

    #[test]
    fn unknown_character_is_reported() {
        let err = Lexer::new("@").tokenize().unwrap_err();
        assert!(matches!(err, EngineError::UnknownCharacter { ch: '@', .. }));
    }

    #[test]
    fn string_literal_keeps_escapes_verbatim() {
        let (tokens, _) = Lexer::new(r"'a\nb'").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, r"'a\nb'");
    }
}
