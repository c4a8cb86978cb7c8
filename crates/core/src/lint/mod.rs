//! Coded diagnostics for a control file.
//!
//! The linter reads the slot-filling result of every grammar line and turns
//! the data-level signals into [`Diagnostic`]s: missing required fields,
//! values that break their field's constraints, tokens no field accepted,
//! fixed-line sections that end early, and documents with no sections.

mod diagnostics_util;

use std::collections::BTreeMap;

use pst_toolchain_diagnostics::{Diagnostic, Severity, Span, codes};
use pst_toolchain_spec_tables::{GrammarTable, SectionLayout};
use serde::Serialize;

use self::diagnostics_util::{diagnostic_with_spec_severity, render_diagnostic_message, trim_f64};
use crate::dispatch::{LineClass, classify};
use crate::document::Document;
use crate::document::segment::{Section, SectionKind};
use crate::slots::{Violation, check, parse_line};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),* $(,)?) => {
        BTreeMap::from([$(($k.into(), $v.into())),*])
    };
}

/// Linter settings.
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// Per-code severity replacing the catalogued default.
    pub severity: BTreeMap<String, Severity>,
}

/// Result of linting one document.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    /// `true` if no errors were found (warnings and info are allowed).
    pub ok: bool,
    /// All diagnostics, ordered by position.
    pub issues: Vec<Diagnostic>,
}

/// Lint `doc` against `table`.
pub fn lint_document(doc: &Document, table: &GrammarTable, options: &LintOptions) -> LintResult {
    let sections = doc.sections();
    let mut issues = Vec::new();

    if sections.iter().all(|s| s.kind == SectionKind::Implicit) {
        let message = render_diagnostic_message(codes::NO_SECTIONS, "default", &[], || {
            "no section headers found".to_string()
        });
        issues.push(diagnostic_with_spec_severity(codes::NO_SECTIONS, message, None));
    }

    for (line, class) in classify(&sections, doc.line_count(), table).into_iter().enumerate() {
        let LineClass::Fields {
            section,
            relative_index,
            grammar,
        } = class
        else {
            continue;
        };
        let section = &sections[section].name;
        let tokens = doc.tokens(line);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        let line_no = (relative_index + 1).to_string();

        for var in parse_line(relative_index, &texts, grammar) {
            let span = var.token.map(|i| doc.token_span(line, &tokens[i]));
            if var.is_missing() {
                if grammar.required().iter().any(|f| f.name == var.name) {
                    issues.push(required_missing(section, &line_no, &var.name, doc.line_span(line)));
                }
                continue;
            }
            if var.is_undefined() {
                issues.push(undefined_token(section, &line_no, &var.value, span));
                continue;
            }
            if var.valid {
                continue;
            }
            let Some(field) = grammar.field(&var.name) else {
                continue;
            };
            if let Err(violation) = check(&var.value, field) {
                issues.push(constraint_violation(section, field, &var.value, violation, span));
            }
        }
    }

    for section in &sections {
        if let Some(diag) = truncated_section(doc, table, section) {
            issues.push(diag);
        }
    }

    for diag in &mut issues {
        if let Some(severity) = options.severity.get(diag.id.as_ref()) {
            diag.severity = *severity;
        }
    }
    issues.sort_by_key(|d| d.span.map_or(usize::MAX, |s| s.start));

    let ok = !issues.iter().any(|d| d.severity == Severity::Error);
    log::debug!("lint finished: {} issue(s), ok={ok}", issues.len());
    LintResult { ok, issues }
}

fn required_missing(section: &str, line: &str, field: &str, span: Option<Span>) -> Diagnostic {
    let message = render_diagnostic_message(
        codes::REQUIRED_MISSING,
        "default",
        &[
            ("section", section.to_string()),
            ("line", line.to_string()),
            ("field", field.to_string()),
        ],
        || format!("missing required field {field}"),
    );
    diagnostic_with_spec_severity(codes::REQUIRED_MISSING, message, span).with_context(ctx!(
        "section" => section,
        "line" => line,
        "field" => field,
    ))
}

fn undefined_token(section: &str, line: &str, value: &str, span: Option<Span>) -> Diagnostic {
    let message = render_diagnostic_message(
        codes::UNDEFINED_TOKEN,
        "default",
        &[
            ("section", section.to_string()),
            ("line", line.to_string()),
            ("value", value.to_string()),
        ],
        || format!("unexpected token '{value}'"),
    );
    diagnostic_with_spec_severity(codes::UNDEFINED_TOKEN, message, span).with_context(ctx!(
        "section" => section,
        "line" => line,
        "value" => value,
    ))
}

fn constraint_violation(
    section: &str,
    field: &pst_toolchain_spec_tables::FieldDescriptor,
    value: &str,
    violation: Violation,
    span: Option<Span>,
) -> Diagnostic {
    let name = field.name.as_str();
    let mut subs = vec![
        ("section", section.to_string()),
        ("field", name.to_string()),
        ("value", value.to_string()),
    ];
    let (id, variant) = match violation {
        Violation::NotInteger => (codes::EXPECTED_INTEGER, "default"),
        Violation::NotNumber => (codes::EXPECTED_NUMERIC, "default"),
        Violation::NotAllowed => {
            let allowed = field.allowed_values().unwrap_or_default().join(", ");
            subs.push(("allowed", allowed));
            (codes::INVALID_ENUM, "default")
        }
        Violation::BelowMin(min) => {
            subs.push(("min", trim_f64(min)));
            (codes::OUT_OF_RANGE, "min")
        }
        Violation::AboveMax(max) => {
            subs.push(("max", trim_f64(max)));
            (codes::OUT_OF_RANGE, "max")
        }
    };
    let message = render_diagnostic_message(id, variant, &subs, || {
        format!("{name}: '{value}' is not {}", field.constraint_summary())
    });
    let context: BTreeMap<String, String> = subs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    diagnostic_with_spec_severity(id, message, span).with_context(context)
}

/// Fixed-line sections whose last non-blank data line comes before the
/// grammar's last line.
fn truncated_section(doc: &Document, table: &GrammarTable, section: &Section) -> Option<Diagnostic> {
    if section.kind != SectionKind::Named {
        return None;
    }
    let spec = table.section(&section.name)?;
    let SectionLayout::Lines { lines } = &spec.layout else {
        return None;
    };
    let found = (section.start_line + 1..=section.end_line)
        .rev()
        .find(|&l| doc.line(l).is_some_and(|t| !t.trim().is_empty()))
        .map_or(0, |last| last - section.start_line);
    let expected = lines.len();
    if found >= expected {
        return None;
    }
    let message = render_diagnostic_message(
        codes::SECTION_TRUNCATED,
        "default",
        &[
            ("section", section.name.clone()),
            ("expected", expected.to_string()),
            ("found", found.to_string()),
        ],
        || format!("{} is incomplete", section.name),
    );
    Some(
        diagnostic_with_spec_severity(codes::SECTION_TRUNCATED, message, doc.line_span(section.start_line))
            .with_context(ctx!(
                "section" => section.name.as_str(),
                "expected" => expected.to_string(),
                "found" => found.to_string(),
            )),
    )
}
