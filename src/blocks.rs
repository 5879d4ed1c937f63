//! Script block extraction.
//!
//! Finds delimiter-balanced test-definition blocks in raw script text by
//! depth tracking rather than real parsing. A proper JavaScript AST would be
//! nicer, but lightweight embeddable JS parsers are thin on the ground, and
//! marker-led depth scanning is enough to locate `describe(...)` / `it(...)`
//! regions reliably. Comments inside a matched block are skipped so a stray
//! apostrophe or bracket in commented-out code does not affect depth
//! tracking; marker occurrences themselves are matched wherever they appear.

/// Error type for block scanning.
#[derive(Debug)]
pub enum ParseError {
    /// A block's delimiters never returned to depth zero.
    Unterminated {
        /// The marker that opened the block.
        marker: String,
        /// Byte offset of the marker occurrence in the source.
        offset: usize,
    },
    /// A string literal inside a block has no closing quote.
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unterminated { marker, offset } => {
                write!(f, "unterminated block for marker {marker:?} at offset {offset}")
            }
            ParseError::UnterminatedString { offset } => {
                write!(f, "unterminated string literal at offset {offset}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A matched block's byte range within the scanned source. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub start: usize,
    pub end: usize,
}

impl BlockSpan {
    /// Whether this span lies entirely inside `other`.
    pub fn is_within(&self, other: &BlockSpan) -> bool {
        self.start > other.start && self.end <= other.end
    }
}

/// Find every top-level block opened by `marker` in `source`, in source order.
///
/// Each returned string is the full matched span including the marker, from
/// the marker's first character to the delimiter that closes it. Occurrences
/// of the marker nested inside an already-matched block are not returned;
/// callers recurse into a block's body themselves.
pub fn find_blocks(source: &str, marker: &str) -> Result<Vec<String>, ParseError> {
    Ok(find_block_spans(source, marker)?
        .into_iter()
        .map(|span| source[span.start..span.end].to_string())
        .collect())
}

/// Like [`find_blocks`] but returns byte spans, for callers that need to
/// order blocks found with different markers by position.
pub fn find_block_spans(source: &str, marker: &str) -> Result<Vec<BlockSpan>, ParseError> {
    let mut spans = Vec::new();
    let mut search_from = 0;

    while let Some(found) = source[search_from..].find(marker) {
        let start = search_from + found;
        match match_block(source, marker, start)? {
            Some(end) => {
                spans.push(BlockSpan { start, end });
                search_from = end;
            }
            // Marker occurrence with no delimiter after it (e.g. the word
            // appearing in prose); not a block, keep scanning.
            None => search_from = start + marker.len(),
        }
    }

    Ok(spans)
}

/// Match one block starting at `start` and return its exclusive end offset,
/// or `None` if no opening delimiter follows the marker.
fn match_block(source: &str, marker: &str, start: usize) -> Result<Option<usize>, ParseError> {
    let bytes = source.as_bytes();

    // The opening delimiter is the marker's own trailing character when the
    // marker carries one (the common `it(` form), otherwise the first
    // non-whitespace character after the marker.
    let mut open_at = start + marker.len();
    if !marker.ends_with('(') && !marker.ends_with('{') {
        while open_at < bytes.len() && bytes[open_at].is_ascii_whitespace() {
            open_at += 1;
        }
    } else {
        open_at -= 1;
    }

    let (open, close) = match bytes.get(open_at) {
        Some(b'(') => (b'(', b')'),
        Some(b'{') => (b'{', b'}'),
        _ => return Ok(None),
    };

    let mut depth = 0usize;
    let mut i = open_at;
    while i < bytes.len() {
        match bytes[i] {
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(i + 1));
                }
            }
            // Comments must not contribute quotes or delimiters.
            b'/' => match bytes.get(i + 1) {
                Some(b'/') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                Some(b'*') => {
                    i += 2;
                    while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                        i += 1;
                    }
                    i += 2;
                    continue;
                }
                _ => {}
            },
            // Delimiters inside string literals must not affect depth.
            quote @ (b'"' | b'\'') => {
                i = skip_string(bytes, i, quote)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    Err(ParseError::Unterminated {
        marker: marker.to_string(),
        offset: start,
    })
}

/// Skip a string literal starting at the opening quote; returns the offset
/// just past the closing quote. Honors backslash escapes.
pub(crate) fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Result<usize, ParseError> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(ParseError::UnterminatedString { offset: start })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_single_block() {
        let src = r#"it("adds", function() { expect(1 + 1).toBe(2); });"#;
        let blocks = find_blocks(src, "it(").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            r#"it("adds", function() { expect(1 + 1).toBe(2); })"#
        );
    }

    #[test]
    fn finds_blocks_in_source_order() {
        let src = r#"
            it("first", function() {});
            it("second", function() {});
            it("third", function() {});
        "#;
        let blocks = find_blocks(src, "it(").unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].contains("first"));
        assert!(blocks[1].contains("second"));
        assert!(blocks[2].contains("third"));
    }

    #[test]
    fn spans_are_increasing_and_disjoint() {
        let src = r#"it("a", function() {}); junk; it("b", function() {});"#;
        let spans = find_block_spans(src, "it(").unwrap();
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
        assert!(spans[0].start < spans[1].start);
    }

    #[test]
    fn nested_marker_not_returned_separately() {
        let src = r#"describe("outer", function() { it("inner", function() {}); });"#;
        let blocks = find_blocks(src, "describe(").unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("inner"));
    }

    #[test]
    fn delimiters_inside_strings_ignored() {
        let src = r#"it("has ) and ( inside", function() { var s = "alert(')')"; });"#;
        let blocks = find_blocks(src, "it(").unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].ends_with(')'));
        assert!(blocks[0].contains("alert"));
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let src = r#"it("quoted \" paren )", function() {});"#;
        let blocks = find_blocks(src, "it(").unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn apostrophe_in_line_comment_ignored() {
        let src = "it(\"works\", function() {\n  // don't touch this\n  f();\n});";
        let blocks = find_blocks(src, "it(").unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].ends_with(')'));
    }

    #[test]
    fn delimiters_in_block_comment_ignored() {
        let src = "it(\"works\", function() { /* }) unbalanced ' */ f(); });";
        let blocks = find_blocks(src, "it(").unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("f();"));
    }

    #[test]
    fn unterminated_block_is_parse_error() {
        let src = r#"it("broken", function() { expect(1).toBe(1); "#;
        let result = find_blocks(src, "it(");
        assert!(matches!(result, Err(ParseError::Unterminated { .. })));
    }

    #[test]
    fn unterminated_string_is_parse_error() {
        let src = r#"it("broken, function() {});"#;
        let result = find_blocks(src, "it(");
        assert!(matches!(result, Err(ParseError::UnterminatedString { .. })));
    }

    #[test]
    fn marker_without_delimiter_is_skipped() {
        // A bare-word marker with no delimiter after any occurrence yields
        // no blocks rather than an error.
        let blocks = find_block_spans("foo bar foo baz", "foo").unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn no_blocks_in_empty_source() {
        assert!(find_blocks("", "it(").unwrap().is_empty());
    }

    #[test]
    fn brace_marker_supported() {
        let src = "setup{ a{ b } c } tail";
        let blocks = find_blocks(src, "setup{").unwrap();
        assert_eq!(blocks, vec!["setup{ a{ b } c }"]);
    }

    #[test]
    fn span_within() {
        let outer = BlockSpan { start: 0, end: 100 };
        let inner = BlockSpan { start: 10, end: 50 };
        assert!(inner.is_within(&outer));
        assert!(!outer.is_within(&inner));
    }
}
