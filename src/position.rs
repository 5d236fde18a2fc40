//! Position-aware source text cursor.
//!
//! Owns the source text with line endings normalized to `\n` and a
//! precomputed table of line-start offsets, so a `Position` can be turned
//! back into the text of its line in O(1) for diagnostics.

/// A position within source text: 0-based line and character offset.
///
/// Rendered 1-based by [`SourceCursor::render_position`] and the
/// diagnostic formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, character {}", self.line + 1, self.character + 1)
    }
}

/// Owns normalized source text plus a line-start index for cheap line
/// extraction. Shared (via `Rc`) between the lexer, every token, and the
/// diagnostic formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCursor {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceCursor {
    pub fn new(source: &str) -> Self {
        let text = normalize_line_endings(source);
        let line_starts = compute_line_starts(&text);
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Characters of `text`, used by the lexer to walk the source.
    pub fn chars(&self) -> std::str::Chars<'_> {
        self.text.chars()
    }

    /// Extract the full line containing `position`, without its trailing
    /// newline, in O(1) via the precomputed `line_starts` table.
    pub fn line(&self, position: Position) -> &str {
        let Some(&start) = self.line_starts.get(position.line) else {
            return "";
        };
        let end = self
            .line_starts
            .get(position.line + 1)
            .map(|&next| next - 1)
            .unwrap_or(self.text.len());
        &self.text[start..end]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn normalize_line_endings(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            c => out.push(c),
        }
    }
    out
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, c) in text.char_indices() {
        if c == '\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_crlf_and_lone_cr() {
        let cursor = SourceCursor::new("a\r\nb\rc\n");
        assert_eq!(cursor.text(), "a\nb\nc\n");
    }

    #[test]
    fn extracts_line_by_position() {
        let cursor = SourceCursor::new("let x = 1;\nprint(x);\n");
        assert_eq!(cursor.line(Position::new(1, 0)), "print(x);");
    }

    #[test]
    fn position_renders_one_based() {
        assert_eq!(Position::new(0, 0).to_string(), "line 1, character 1");
    }
}
