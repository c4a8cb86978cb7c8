/// A whitespace-delimited token that borrows its text from a line.
///
/// `text` is always exactly `&line[start..end]`; offsets are byte columns
/// within the line, not the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Borrowed token text.
    pub text: &'a str,
    /// Byte column of the first character.
    pub start: usize,
    /// Byte column one past the last character.
    pub end: usize,
}

impl Token<'_> {
    /// Whether a cursor at byte column `col` touches this token.
    ///
    /// The position just after the last character counts, so a cursor
    /// parked at the end of a word still resolves to it.
    pub fn touches(&self, col: usize) -> bool {
        self.start <= col && col <= self.end
    }
}

/// Split one line into whitespace-delimited tokens.
pub fn tokenize_line(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token {
                    text: &line[s..i],
                    start: s,
                    end: i,
                });
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &line[s..],
            start: s,
            end: line.len(),
        });
    }
    tokens
}
