//! `++name(value)` option lines used by PEST++.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+\+(\w+)(?:\(([^)]*)\))?").expect("option pattern is valid")
});

/// One `++name(value)` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionOption {
    /// Option name without the `++` prefix, as written.
    pub name: String,
    /// Text between the parentheses, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Byte column of the leading `+`.
    pub start: usize,
    /// Byte column one past the option text.
    pub end: usize,
}

/// Every option written on `line`, left to right.
pub fn parse_options(line: &str) -> Vec<ExtensionOption> {
    OPTION
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(ExtensionOption {
                name: caps.get(1)?.as_str().to_string(),
                value: caps.get(2).map(|v| v.as_str().trim().to_string()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// The option under byte column `col`, if any.
pub fn option_at(line: &str, col: usize) -> Option<ExtensionOption> {
    parse_options(line)
        .into_iter()
        .find(|opt| opt.start <= col && col <= opt.end)
}
