/// Whitespace tokenizer for single lines.
pub mod lexer;
/// Section segmentation.
pub mod segment;

use pst_toolchain_diagnostics::{LineIndex, Span};

use self::lexer::{Token, tokenize_line};
use self::segment::{Section, segment};

/// An immutable snapshot of a control file with normalized line endings.
///
/// `\r\n` and lone `\r` are rewritten to `\n` on construction, so every
/// offset handed out by a `Document` refers to the normalized text.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    index: LineIndex,
}

impl Document {
    /// Normalize `raw` and index its lines.
    pub fn new(raw: &str) -> Self {
        let text = if raw.contains('\r') {
            raw.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            raw.to_string()
        };
        let index = LineIndex::new(&text);
        Self { text, index }
    }

    /// The normalized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The line index over the normalized text.
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Number of lines (a trailing newline opens an empty last line).
    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Text of a 0-based line, without its newline.
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = self.index.line_start(line)?;
        let end = self
            .index
            .line_start(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        Some(&self.text[start..end])
    }

    /// All lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Tokens of a 0-based line (empty when the line does not exist).
    pub fn tokens(&self, line: usize) -> Vec<Token<'_>> {
        self.line(line).map(tokenize_line).unwrap_or_default()
    }

    /// Sections of this document.
    pub fn sections(&self) -> Vec<Section> {
        let lines: Vec<&str> = self.lines().collect();
        segment(&lines)
    }

    /// Document-level byte span of a token on `line`.
    pub fn token_span(&self, line: usize, token: &Token<'_>) -> Span {
        let base = self.index.line_start(line).unwrap_or(self.text.len());
        Span::new(base + token.start, base + token.end)
    }

    /// Document-level byte span of a whole line, newline excluded.
    pub fn line_span(&self, line: usize) -> Option<Span> {
        let start = self.index.line_start(line)?;
        Some(Span::new(start, start + self.line(line)?.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_line_endings() {
        let doc = Document::new("pcf\r\n* control data\rrestart estimation\n");
        assert_eq!(doc.text(), "pcf\n* control data\nrestart estimation\n");
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.line(2), Some("restart estimation"));
        assert_eq!(doc.line(3), Some(""));
        assert_eq!(doc.line(4), None);
    }

    #[test]
    fn lines_iterator_matches_line_lookup() {
        let doc = Document::new("a\n\nb");
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines, ["a", "", "b"]);
        for (i, l) in lines.iter().enumerate() {
            assert_eq!(doc.line(i), Some(*l));
        }
    }

    #[test]
    fn token_spans_are_document_offsets() {
        let doc = Document::new("* svd\n  1\n");
        let toks = doc.tokens(1);
        let span = doc.token_span(1, &toks[0]);
        assert_eq!((span.start, span.end), (8, 9));
        assert_eq!(&doc.text()[span.start..span.end], "1");
        assert_eq!(doc.line_span(1), Some(Span::new(6, 9)));
    }

    #[test]
    fn sections_use_normalized_lines() {
        let doc = Document::new("* control data\r\n1\r\n* svd\r\n1");
        let sections = doc.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].name, "svd");
        assert_eq!(sections[1].end_line, 3);
    }
}
