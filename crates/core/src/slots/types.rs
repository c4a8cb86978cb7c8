use std::sync::LazyLock;

use pst_toolchain_spec_tables::{Bounds, FieldDescriptor, FieldKind};
use regex::Regex;
use serde::Serialize;

static FLOAT_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?[0-9]*\.?[0-9]+(?:[eE][+-]?[0-9]+)?$").expect("float pattern is valid")
});

/// Why a token was rejected by a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "bound", rename_all = "camelCase")]
pub enum Violation {
    /// Not a base-10 integer.
    NotInteger,
    /// Not a finite real number.
    NotNumber,
    /// Not among the field's allowed values.
    NotAllowed,
    /// Below the inclusive minimum carried here.
    BelowMin(f64),
    /// Above the inclusive maximum carried here.
    AboveMax(f64),
}

/// Check `token` against a field's constraints.
///
/// A choice field decides by membership alone, ignoring any declared bounds.
/// Numeric fields check the shape first, then bounds. Text fields accept
/// everything.
pub fn check(token: &str, field: &FieldDescriptor) -> Result<(), Violation> {
    match &field.kind {
        FieldKind::Choice(choice) => {
            if choice.accepts(token) {
                Ok(())
            } else {
                Err(Violation::NotAllowed)
            }
        }
        FieldKind::Integer(bounds) => {
            let value = parse_integer(token).ok_or(Violation::NotInteger)?;
            check_bounds(value as f64, bounds)
        }
        FieldKind::Float(bounds) => {
            let value = parse_float(token).ok_or(Violation::NotNumber)?;
            check_bounds(value, bounds)
        }
        FieldKind::Text => Ok(()),
    }
}

/// Whether `token` satisfies the field's constraints.
pub fn validate(token: &str, field: &FieldDescriptor) -> bool {
    check(token, field).is_ok()
}

fn check_bounds(value: f64, bounds: &Bounds) -> Result<(), Violation> {
    if let Some(min) = bounds.min
        && value < min
    {
        return Err(Violation::BelowMin(min));
    }
    if let Some(max) = bounds.max
        && value > max
    {
        return Err(Violation::AboveMax(max));
    }
    Ok(())
}

/// Parse `[+-]?[0-9]+` as an `i64`. Overflow is a failure.
pub fn parse_integer(token: &str) -> Option<i64> {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Parse a decimal real with an optional exponent. Non-finite results are a
/// failure.
pub fn parse_float(token: &str) -> Option<f64> {
    if !FLOAT_SHAPE.is_match(token) {
        return None;
    }
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        let f = FieldDescriptor::integer("N");
        for ok in ["0", "42", "-2", "+7", "007"] {
            assert!(validate(ok, &f), "{ok}");
        }
        for bad in ["", "-", "1.0", "1.", "1e3", "abc", "1_000", "99999999999999999999"] {
            assert_eq!(check(bad, &f), Err(Violation::NotInteger), "{bad}");
        }
    }

    #[test]
    fn integer_bounds_are_inclusive() {
        let f = FieldDescriptor::integer("NOPTMAX").min(-2.0);
        assert!(validate("-2", &f));
        assert_eq!(check("-3", &f), Err(Violation::BelowMin(-2.0)));
        let f = FieldDescriptor::integer("LASTRUN").min(0.0).max(1.0);
        assert!(validate("1", &f));
        assert_eq!(check("2", &f), Err(Violation::AboveMax(1.0)));
    }

    #[test]
    fn floats() {
        let f = FieldDescriptor::float("X");
        for ok in ["1", "1.0", ".5", "-0.25", "+3", "2.5E-04", "1e10", "-1.5e+3"] {
            assert!(validate(ok, &f), "{ok}");
        }
        for bad in ["", "1.", "e5", "1.0d0", "nan", "inf", "1e999", "1,5", "--1"] {
            assert_eq!(check(bad, &f), Err(Violation::NotNumber), "{bad}");
        }
    }

    #[test]
    fn float_bounds() {
        let f = FieldDescriptor::float("PHIRATSUF").min(0.0).max(1.0);
        assert!(validate("0.3", &f));
        assert!(validate("1.0", &f));
        assert_eq!(check("1.01", &f), Err(Violation::AboveMax(1.0)));
        assert_eq!(check("-1E-9", &f), Err(Violation::BelowMin(0.0)));
    }

    #[test]
    fn text_accepts_anything() {
        assert!(validate("anything at all", &FieldDescriptor::text("S")));
    }

    #[test]
    fn choice_ignores_bounds() {
        let f = FieldDescriptor::choice("JACFILE", &["-1", "0", "1"]).min(5.0).max(6.0);
        assert!(validate("-1", &f));
        assert_eq!(check("5", &f), Err(Violation::NotAllowed));
    }

    #[test]
    fn choice_case_sensitivity() {
        let exact = FieldDescriptor::choice("PRECIS", &["single", "double"]);
        assert!(validate("double", &exact));
        assert!(!validate("DOUBLE", &exact));

        let loose = FieldDescriptor::choice("RSTFLE", &["restart", "norestart"]).ignore_case();
        assert!(validate("RESTART", &loose));
        assert!(validate("NoRestart", &loose));
        assert!(!validate("re-start", &loose));
    }
}
