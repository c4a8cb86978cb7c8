//! Model file references in the `model command line` and
//! `model input/output` sections.

use std::path::{Path, PathBuf};

use pst_toolchain_spec_tables::{FileTokens, GrammarTable, SectionLayout};
use serde::Serialize;

use crate::document::Document;
use crate::document::segment::SectionKind;

/// A path written in a file-list section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    /// 0-based line.
    pub line: usize,
    /// Byte column of the first character.
    pub start: usize,
    /// Byte column one past the last character.
    pub end: usize,
    /// The path as written.
    pub raw: String,
    /// `raw` resolved against the control file's directory.
    pub resolved: PathBuf,
}

/// Resolve a path written in a control file.
///
/// Relative paths are joined to `base_dir`; absolute paths are returned
/// unchanged.
pub fn resolve(base_dir: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Indices of the tokens on a file-list line that name files.
///
/// Every token counts under [`FileTokens::All`]. A command line counts the
/// tokens that look like paths (a separator or an extension, and not a
/// `-` flag), so `python run.py --fast` yields `run.py`. A command with no
/// such token yields its program, so `pest_model` still resolves.
pub fn path_tokens(mode: FileTokens, tokens: &[&str]) -> Vec<usize> {
    match mode {
        FileTokens::All => (0..tokens.len()).collect(),
        FileTokens::Command => {
            let paths: Vec<usize> = tokens
                .iter()
                .enumerate()
                .filter(|(_, text)| looks_like_path(text))
                .map(|(i, _)| i)
                .collect();
            if paths.is_empty() && !tokens.is_empty() {
                vec![0]
            } else {
                paths
            }
        }
    }
}

fn looks_like_path(text: &str) -> bool {
    !text.starts_with('-')
        && (text.contains(['/', '\\']) || Path::new(text).extension().is_some())
}

/// Collect every file reference in the document.
///
/// `base_dir` is the directory holding the control file.
pub fn file_references(doc: &Document, table: &GrammarTable, base_dir: &Path) -> Vec<FileReference> {
    let mut refs = Vec::new();
    for section in doc.sections() {
        if section.kind != SectionKind::Named {
            continue;
        }
        let Some(spec) = table.section(&section.name) else {
            continue;
        };
        let SectionLayout::Files { tokens: mode } = spec.layout else {
            continue;
        };
        for line in section.start_line + 1..=section.end_line {
            let tokens = doc.tokens(line);
            let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
            refs.extend(path_tokens(mode, &texts).into_iter().map(|i| {
                let tok = &tokens[i];
                FileReference {
                    line,
                    start: tok.start,
                    end: tok.end,
                    raw: tok.text.to_string(),
                    resolved: resolve(base_dir, tok.text),
                }
            }));
        }
    }
    refs
}
