use std::collections::HashMap;

use pst_toolchain_diagnostics::{Diagnostic, Severity, Span, message_template_for, severity_for_code};

/// Build a diagnostic at its catalogued severity.
pub(super) fn diagnostic_with_spec_severity(
    id: &'static str,
    message: impl Into<String>,
    span: Option<Span>,
) -> Diagnostic {
    Diagnostic::new(
        id,
        severity_for_code(id).unwrap_or(Severity::Warn),
        message.into(),
        span,
    )
}

/// Fill the `{key}` placeholders of the `(id, variant)` template.
///
/// Unknown keys are left as written. Falls back to `fallback` when no
/// template is registered.
pub(super) fn render_diagnostic_message(
    id: &'static str,
    variant: &str,
    substitutions: &[(&str, String)],
    fallback: impl FnOnce() -> String,
) -> String {
    let Some(template) = message_template_for(id, variant) else {
        return fallback();
    };
    let values: HashMap<&str, &str> = substitutions
        .iter()
        .map(|(key, value)| (*key, value.as_str()))
        .collect();

    let mut rendered = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}').map(|c| open + c) else {
            rest = &rest[open..];
            break;
        };
        let key = &rest[open + 1..close];
        match values.get(key) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
    rendered.push_str(rest);
    rendered
}

/// Format a bound without trailing zeros.
pub(super) fn trim_f64(n: f64) -> String {
    let s = format!("{n:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" => "0".to_string(),
        s => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pst_toolchain_diagnostics::codes;

    #[test]
    fn fills_placeholders() {
        let msg = render_diagnostic_message(
            codes::EXPECTED_INTEGER,
            "default",
            &[("field", "NPAR".into()), ("value", "1.5".into())],
            String::new,
        );
        assert_eq!(msg, "NPAR expects an integer, found '1.5'");
    }

    #[test]
    fn unknown_keys_stay_verbatim() {
        let msg = render_diagnostic_message(codes::EXPECTED_INTEGER, "default", &[], String::new);
        assert_eq!(msg, "{field} expects an integer, found '{value}'");
    }

    #[test]
    fn missing_template_uses_fallback() {
        let msg = render_diagnostic_message(codes::OUT_OF_RANGE, "default", &[], || "fb".into());
        assert_eq!(msg, "fb");
    }

    #[test]
    fn trims_bounds() {
        assert_eq!(trim_f64(1.0), "1");
        assert_eq!(trim_f64(0.25), "0.25");
        assert_eq!(trim_f64(-2.0), "-2");
        assert_eq!(trim_f64(0.0), "0");
    }

    #[test]
    fn spec_severity_comes_from_the_catalogue() {
        let d = diagnostic_with_spec_severity(codes::UNDEFINED_TOKEN, "x", None);
        assert_eq!(d.severity, Severity::Warn);
        let d = diagnostic_with_spec_severity(codes::SECTION_TRUNCATED, "x", None);
        assert_eq!(d.severity, Severity::Info);
    }
}
