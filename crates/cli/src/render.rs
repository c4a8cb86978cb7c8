//! Terminal rendering for lint diagnostics, checker findings and lookups.
//!
//! Lint diagnostics carry byte spans into the control file and go through
//! ariadne for source-annotated output. Checker findings only know a file
//! and a line, so they are printed as a plain per-file listing.

use std::io::{self, IsTerminal};
use std::path::Path;

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use pst_toolchain_checker::Report as CheckerReport;
use pst_toolchain_core::files::FileReference;
use pst_toolchain_core::{Description, Target};
use pst_toolchain_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else pretty on a TTY and JSON on a pipe.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        _ => ReportKind::Advice,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::Cyan,
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warn => "warning",
        Severity::Info => "info",
        _ => "hint",
    }
}

// ── Lint diagnostics ────────────────────────────────────────────────────

/// Render lint diagnostics to stderr, with source context where a span exists.
pub(crate) fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default().with_compact(false);
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        let note = diag.context.as_ref().filter(|c| !c.is_empty()).map(|ctx| {
            ctx.iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ")
        });

        let Some(span) = &diag.span else {
            eprintln!(
                "{}[{}]: {}",
                severity_label(diag.severity),
                diag.id,
                diag.message
            );
            if let Some(note) = &note {
                eprintln!("  = note: {note}");
            }
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
            continue;
        };

        let start = span.start.min(source.len());
        let end = span.end.min(source.len()).max(start);

        let mut builder = Report::build(report_kind(diag.severity), (filename, start..end))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(config)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(note.clone().unwrap_or_else(|| diag.message.clone()))
                    .with_color(severity_color(diag.severity)),
            );
        if let Some(explanation) = diag.explain() {
            builder = builder.with_help(explanation);
        }
        builder.finish().eprint(&mut cache).ok();
    }
}

// ── Checker findings ────────────────────────────────────────────────────

/// Print findings grouped by file to stdout.
///
/// ```text
/// /work/model.tpl
///   7: error: parameter "k1" is not cited in the control file
/// ```
pub(crate) fn print_findings(report: &CheckerReport) {
    for (file, findings) in report.by_file() {
        println!("{}", file.display().fg(Color::Cyan));
        for finding in findings {
            let label = severity_label(finding.severity).fg(severity_color(finding.severity));
            println!("  {}: {label}: {}", finding.range.start.line + 1, finding.message);
        }
    }
}

// ── Lookup ──────────────────────────────────────────────────────────────

/// Print what [`pst_toolchain_core::lookup`] found, and its description.
pub(crate) fn print_target(
    target: &Target,
    resolved: Option<&Path>,
    description: Option<&Description>,
) {
    match target {
        Target::Field {
            section,
            variable,
            descriptor,
        } => {
            let validity = if variable.valid { "valid" } else { "invalid" };
            println!(
                "{} = {}  ({section}, {}, {validity})",
                variable.name.as_str().fg(Color::Cyan),
                variable.value,
                descriptor.constraint_summary()
            );
        }
        Target::Undefined { section, variable } => {
            println!(
                "{}  ({section}, not accepted by any field on this line)",
                variable.value.as_str().fg(Color::Yellow)
            );
        }
        Target::Column {
            section,
            column,
            value,
        } => println!("{} = {value}  ({section})", column.as_str().fg(Color::Cyan)),
        Target::Extension { option } => match &option.value {
            Some(value) => println!("++{}({value})", option.name.as_str().fg(Color::Cyan)),
            None => println!("++{}", option.name.as_str().fg(Color::Cyan)),
        },
        Target::File { section, path } => println!("{}  ({section})", path.as_str().fg(Color::Cyan)),
    }
    if let Some(resolved) = resolved {
        println!("-> {}", resolved.display());
    }

    if let Some(desc) = description {
        println!();
        println!("{}", desc.description);
        if !desc.values.is_empty() {
            println!("values: {}", desc.values);
        }
        if desc.mandatory {
            println!("required");
        }
    }
}

// ── File references ─────────────────────────────────────────────────────

/// Print one model file reference, marking it when it is missing.
///
/// ```text
///   31: ves.tpl -> /runs/case/ves.tpl
///   32: a_model.in1 -> /runs/case/a_model.in1 (missing)
/// ```
pub(crate) fn print_files(reference: &FileReference, exists: bool) {
    let status = if exists {
        String::new()
    } else {
        format!(" {}", "(missing)".fg(Color::Yellow))
    };
    println!(
        "  {}: {} -> {}{status}",
        reference.line + 1,
        reference.raw.as_str().fg(Color::Cyan),
        reference.resolved.display()
    );
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured count line such as `2 errors, 1 warning` to stderr.
pub(crate) fn print_summary(severities: impl IntoIterator<Item = Severity>) {
    let (mut errors, mut warnings, mut infos) = (0usize, 0usize, 0usize);
    for severity in severities {
        match severity {
            Severity::Error => errors += 1,
            Severity::Warn => warnings += 1,
            _ => infos += 1,
        }
    }
    if errors + warnings + infos == 0 {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!(
            "{}",
            format!("{warnings} warning{s}").fg(Color::Yellow)
        ));
    }
    if infos > 0 {
        parts.push(format!("{}", format!("{infos} info").fg(Color::Blue)));
    }
    eprintln!("{}", parts.join(", "));
}
