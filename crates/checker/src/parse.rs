//! Line-by-line fold over PESTCHEK output.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use pst_toolchain_diagnostics::Severity;
use regex::Regex;

use crate::{Finding, Range, Report, ReportContext};

static LINE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Line\s+(\d+)\s+of\s+(?:instruction\s+)?file\s+((?:[A-Za-z]:)?[^:]+):\s*(.*)$")
        .expect("line header pattern is valid")
});

static FILE_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\w\-./\\:]+\.(?:pst|tpl|ins|pmt))\b").expect("file mention pattern is valid")
});

const ERRORS_SENTINEL: &str = "Errors ----->";
const WARNINGS_SENTINEL: &str = "Warnings ----->";
const REGULARISATION_NOTICE: &str = "If PEST is run in regularisation mode";

/// Messages PESTCHEK stops printing when run with `/s`.
pub const SUPPRESSIBLE_CHECKS: [&str; 7] = [
    "is not cited in a template file",
    "not cited in an instruction file",
    "covariance matrix",
    "NOPTMAX provided as -2.",
    "NOPTMAX provided as -1.",
    "NOPTMAX provided as 0",
    "MAXSING in the singular value decomposition section is greater than the",
];

/// The entries of [`SUPPRESSIBLE_CHECKS`] that occur in `output`, compared
/// case-insensitively.
pub fn suppressible_checks(output: &str) -> Vec<&'static str> {
    let lowered = output.to_lowercase();
    SUPPRESSIBLE_CHECKS
        .iter()
        .copied()
        .filter(|phrase| lowered.contains(&phrase.to_lowercase()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Errors,
    Warnings,
}

impl Block {
    fn severity(self) -> Option<Severity> {
        match self {
            Block::None => None,
            Block::Errors => Some(Severity::Error),
            Block::Warnings => Some(Severity::Warn),
        }
    }
}

#[derive(Debug)]
struct Pending {
    severity: Severity,
    file: Option<String>,
    line: Option<u32>,
    message: String,
}

impl Pending {
    fn push_line(&mut self, text: &str) {
        if !self.message.is_empty() {
            self.message.push(' ');
        }
        self.message.push_str(text);
    }
}

struct Fold<'c> {
    ctx: &'c ReportContext,
    block: Block,
    pending: Option<Pending>,
    findings: Vec<Finding>,
}

impl Fold<'_> {
    fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let message = pending.message.trim().to_string();
        if message.is_empty() {
            return;
        }

        if let Some(file) = &pending.file {
            let own = self.ctx.resolve(file);
            let others = mentioned_files(&message, &own, self.ctx);
            if !others.is_empty() {
                log::debug!("message for {file} names {} other file(s)", others.len());
                for path in std::iter::once(own).chain(others) {
                    self.emit(pending.severity, path, 0, message.clone());
                }
                return;
            }
        }

        let file = pending
            .file
            .as_deref()
            .map_or_else(|| self.ctx.origin().to_path_buf(), |f| self.ctx.resolve(f));
        let line = pending.line.map_or(0, |n| n.saturating_sub(1));
        self.emit(pending.severity, file, line, message);
    }

    fn emit(&mut self, severity: Severity, file: PathBuf, line: u32, message: String) {
        self.findings.push(Finding {
            severity,
            file,
            range: Range::whole_line(line),
            message,
        });
    }

    fn start(&mut self, severity: Severity, file: Option<String>, line: Option<u32>, message: &str) {
        self.flush();
        self.pending = Some(Pending {
            severity,
            file,
            line,
            message: message.trim().to_string(),
        });
    }
}

/// Resolved files with a control, template, instruction or parameter-file
/// extension named in `message`, other than `own`. Paths are compared
/// without regard to ASCII case.
fn mentioned_files(message: &str, own: &Path, ctx: &ReportContext) -> Vec<PathBuf> {
    let same = |a: &Path, b: &Path| a.to_string_lossy().eq_ignore_ascii_case(&b.to_string_lossy());
    let mut out: Vec<PathBuf> = Vec::new();
    for caps in FILE_MENTION.captures_iter(message) {
        let path = ctx.resolve(&caps[1]);
        if same(&path, own) || out.iter().any(|o| same(o, &path)) {
            continue;
        }
        out.push(path);
    }
    out
}

/// Fold PESTCHEK output into findings.
///
/// Text before the first `Errors ----->` or `Warnings ----->` line is
/// ignored, except the regularisation-mode notice which is always an error.
/// Reported 1-based lines become 0-based; messages without a file belong to
/// the context's control file.
pub fn parse_report(output: &str, ctx: &ReportContext) -> Report {
    let mut fold = Fold {
        ctx,
        block: Block::None,
        pending: None,
        findings: Vec::new(),
    };

    let mut lines = output.lines().map(str::trim).peekable();
    while let Some(line) = lines.next() {
        if line.starts_with("PESTCHEK Version") || line == "No errors encountered." {
            continue;
        }
        if line.starts_with(ERRORS_SENTINEL) {
            fold.flush();
            fold.block = Block::Errors;
            continue;
        }
        if line.starts_with(WARNINGS_SENTINEL) {
            fold.flush();
            fold.block = Block::Warnings;
            continue;
        }
        if line.contains(REGULARISATION_NOTICE) {
            fold.start(Severity::Error, None, None, line);
            continue;
        }
        if line.is_empty() {
            fold.flush();
            continue;
        }
        let Some(severity) = fold.block.severity() else {
            if let Some(pending) = fold.pending.as_mut() {
                pending.push_line(line);
            }
            continue;
        };

        if let Some(caps) = LINE_HEADER.captures(line) {
            let number = caps[1].parse::<u32>().ok();
            let file = caps[2].trim().to_string();
            fold.start(severity, Some(file), number, &caps[3]);
            continue;
        }

        if line.starts_with("Cannot open") {
            fold.flush();
            let mut message = line.to_string();
            if let Some(next) = lines.next_if(|next| next.starts_with("observation group")) {
                message.push(' ');
                message.push_str(next);
            }
            let origin = ctx.origin().to_path_buf();
            fold.emit(Severity::Error, origin, 0, message);
            continue;
        }

        match fold.pending.as_mut() {
            Some(pending) => pending.push_line(line),
            None => fold.start(severity, None, None, line),
        }
    }
    fold.flush();

    log::debug!("checker report: {} finding(s)", fold.findings.len());
    Report {
        findings: fold.findings,
    }
}
