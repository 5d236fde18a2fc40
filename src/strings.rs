//! Shared string-literal unescaping, used once per literal by both
//! execution engines. Token text still carries its surrounding quotes
//! and escapes verbatim (§4.1); this is where that gets resolved.
pub fn unescape_literal(text: &str) -> String {
    let inner = text
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(text);
    unescape::unescape(inner).unwrap_or_else(|| inner.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_resolves_known_escapes() {
        assert_eq!(unescape_literal(r"'a\nb'"), "a\nb");
        assert_eq!(unescape_literal(r"'\t'"), "\t");
        assert_eq!(unescape_literal(r"'\''"), "'");
    }
}
