//! JSONC to JSON conversion for the data files under `spec/`.
//!
//! Removes `//` line comments and `/* ... */` block comments, and drops
//! trailing commas before a closing `}` or `]`. String literals (including
//! escaped quotes) pass through untouched.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str,
    StrEscape,
    LineComment,
    BlockComment,
    BlockCommentStar,
}

/// Convert JSONC text to plain JSON.
///
/// Line comments keep their terminating newline so line numbers in
/// `serde_json` errors still match the source file.
#[must_use]
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    // Byte offset in `out` of a comma that has only seen whitespace since.
    let mut dangling_comma: Option<usize> = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    State::LineComment
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    State::BlockComment
                }
                '"' => {
                    dangling_comma = None;
                    out.push(c);
                    State::Str
                }
                ',' => {
                    dangling_comma = Some(out.len());
                    out.push(c);
                    State::Code
                }
                '}' | ']' => {
                    if let Some(at) = dangling_comma.take() {
                        out.remove(at);
                    }
                    out.push(c);
                    State::Code
                }
                c if c.is_whitespace() => {
                    out.push(c);
                    State::Code
                }
                _ => {
                    dangling_comma = None;
                    out.push(c);
                    State::Code
                }
            },
            State::Str => {
                out.push(c);
                match c {
                    '\\' => State::StrEscape,
                    '"' => State::Code,
                    _ => State::Str,
                }
            }
            State::StrEscape => {
                out.push(c);
                State::Str
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    State::Code
                } else {
                    State::LineComment
                }
            }
            State::BlockComment | State::BlockCommentStar => match c {
                '/' if state == State::BlockCommentStar => State::Code,
                '*' => State::BlockCommentStar,
                '\n' => {
                    out.push(c);
                    State::BlockComment
                }
                _ => State::BlockComment,
            },
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::strip_jsonc;

    #[test]
    fn removes_comments_of_both_kinds() {
        let input = "{\n  // heading\n  \"a\": 1, /* inline */ \"b\": 2\n}\n";
        let stripped = strip_jsonc(input);
        assert!(!stripped.contains("heading"));
        assert!(!stripped.contains("inline"));
        assert!(stripped.contains("\"a\": 1"));
        assert!(stripped.contains("\"b\": 2"));
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let input = r#"{ "path": "a//b/*c*/", "q": "say \"//hi\"" }"#;
        assert_eq!(strip_jsonc(input), input);
    }

    #[test]
    fn preserves_line_count() {
        let input = "{\n/* one\ntwo */\n\"x\": 1 // tail\n}";
        assert_eq!(strip_jsonc(input).lines().count(), input.lines().count());
    }

    #[test]
    fn drops_trailing_commas() {
        let input = "{ \"a\": [1, 2, ], \"b\": { \"c\": 3, // note\n }, }";
        let stripped = strip_jsonc(input);
        let value: Vec<char> = stripped.chars().filter(|c| !c.is_whitespace()).collect();
        let compact: String = value.into_iter().collect();
        assert_eq!(compact, "{\"a\":[1,2],\"b\":{\"c\":3}}");
    }

    #[test]
    fn commas_inside_strings_are_untouched() {
        let input = r#"["a,", "]"]"#;
        assert_eq!(strip_jsonc(input), input);
    }

    #[test]
    fn unterminated_block_comment_swallows_rest() {
        assert_eq!(strip_jsonc("[1] /* open"), "[1] ");
    }
}
