//! Structured findings from PESTCHEK output.
//!
//! PESTCHEK prints free text: a version banner, an `Errors ----->` block and
//! a `Warnings ----->` block, with messages that may name a file and line and
//! may wrap over several lines. [`parse_report`] folds that text into
//! [`Finding`]s with resolved file paths and 0-based line ranges.

#![warn(missing_docs)]

mod error;
mod parse;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

pub use error::CheckerError;
pub use parse::{SUPPRESSIBLE_CHECKS, parse_report, suppressible_checks};
pub use pst_toolchain_diagnostics::Severity;

/// Character offset standing for "end of the line".
pub const END_OF_LINE: u32 = u32::MAX;

/// A 0-based line and character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// 0-based line.
    pub line: u32,
    /// 0-based character.
    pub character: u32,
}

/// A range of text in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    /// First position.
    pub start: Position,
    /// Position one past the end.
    pub end: Position,
}

impl Range {
    /// The whole of 0-based `line`.
    pub fn whole_line(line: u32) -> Self {
        Self {
            start: Position { line, character: 0 },
            end: Position {
                line,
                character: END_OF_LINE,
            },
        }
    }
}

/// One message from the checker, attributed to a file and line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// `Error` inside the errors block, `Warn` inside the warnings block.
    pub severity: Severity,
    /// Absolute path of the file the message is about.
    pub file: PathBuf,
    /// Always a whole line.
    pub range: Range,
    /// Message text with wrapped lines joined by single spaces.
    pub message: String,
}

/// Where a report came from.
#[derive(Debug, Clone)]
pub struct ReportContext {
    workspace_root: PathBuf,
    origin: PathBuf,
}

impl ReportContext {
    /// Build a context for a report produced by checking `origin_file`.
    ///
    /// `workspace_root` must be an existing directory; `origin_file` is
    /// resolved against it when relative.
    pub fn new(workspace_root: &Path, origin_file: &Path) -> Result<Self, CheckerError> {
        if !workspace_root.is_dir() {
            return Err(CheckerError::MissingRoot {
                path: workspace_root.to_path_buf(),
            });
        }
        let workspace_root =
            std::path::absolute(workspace_root).map_err(|source| CheckerError::InvalidRoot {
                path: workspace_root.to_path_buf(),
                source,
            })?;
        let origin = resolve(&workspace_root, &origin_file.to_string_lossy());
        Ok(Self {
            workspace_root,
            origin,
        })
    }

    /// The absolute workspace root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The control file the report is about.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Resolve a path as written in the report.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        resolve(&self.workspace_root, raw)
    }
}

fn resolve(root: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw.trim());
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    // Drop `.` components so `./m.tpl` and `m.tpl` compare equal.
    joined.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

/// Per-severity totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Error findings.
    pub errors: usize,
    /// Warning findings.
    pub warnings: usize,
    /// Info and hint findings.
    pub other: usize,
}

/// All findings of one checker run, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Findings in the order they were printed.
    pub findings: Vec<Finding>,
}

impl Report {
    /// Findings grouped by file, files in path order.
    pub fn by_file(&self) -> BTreeMap<&Path, Vec<&Finding>> {
        let mut map: BTreeMap<&Path, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            map.entry(finding.file.as_path()).or_default().push(finding);
        }
        map
    }

    /// Totals per severity.
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warn => counts.warnings += 1,
                _ => counts.other += 1,
            }
        }
        counts
    }

    /// Whether any finding is an error.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// Drop every warning, as PESTCHEK's `/s` switch would.
    pub fn without_warnings(mut self) -> Self {
        self.findings.retain(|f| f.severity != Severity::Warn);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity, file: &str) -> Finding {
        Finding {
            severity,
            file: PathBuf::from(file),
            range: Range::whole_line(0),
            message: String::new(),
        }
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = ReportContext::new(Path::new("/no/such/workspace/root"), Path::new("a.pst")).unwrap_err();
        assert!(matches!(err, CheckerError::MissingRoot { .. }));
    }

    #[test]
    fn origin_resolves_against_root() {
        let root = std::env::temp_dir();
        let ctx = ReportContext::new(&root, Path::new("case.pst")).unwrap();
        assert!(ctx.origin().is_absolute());
        assert!(ctx.origin().ends_with("case.pst"));
        assert_eq!(ctx.resolve("sub/m.tpl"), ctx.workspace_root().join("sub/m.tpl"));
    }

    #[test]
    fn current_dir_components_are_dropped() {
        let ctx = ReportContext::new(&std::env::temp_dir(), Path::new("case.pst")).unwrap();
        assert_eq!(ctx.resolve("./m.tpl"), ctx.resolve("m.tpl"));
        assert_eq!(ctx.resolve("sub/./m.tpl"), ctx.workspace_root().join("sub/m.tpl"));
    }

    #[test]
    fn groups_and_counts() {
        let report = Report {
            findings: vec![
                finding(Severity::Warn, "/w/b.pst"),
                finding(Severity::Error, "/w/a.tpl"),
                finding(Severity::Error, "/w/b.pst"),
            ],
        };
        let groups = report.by_file();
        let files: Vec<&Path> = groups.keys().copied().collect();
        assert_eq!(files, [Path::new("/w/a.tpl"), Path::new("/w/b.pst")]);
        assert_eq!(groups[Path::new("/w/b.pst")].len(), 2);
        assert_eq!(
            report.counts(),
            Counts {
                errors: 2,
                warnings: 1,
                other: 0
            }
        );
        assert!(report.has_errors());
        assert_eq!(report.without_warnings().findings.len(), 2);
    }

    #[test]
    fn whole_line_range_serializes_the_sentinel() {
        let json = serde_json::to_value(Range::whole_line(4)).unwrap();
        assert_eq!(json["start"]["line"], 4);
        assert_eq!(json["end"]["character"], u64::from(u32::MAX));
    }
}
