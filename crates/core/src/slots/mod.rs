//! Slot filling: assigning the tokens of one line to named fields.
//!
//! Required fields take tokens strictly by position. Every token left over
//! is offered to the optional fields that are still empty, in declared
//! order, and the first one whose constraints accept it claims it. Tokens no
//! field accepts are reported as [`UNDEFINED`]. The assignment is greedy and
//! first-fit; it does not search for a globally best match.

/// Token validation against field constraints.
pub mod types;

use std::collections::HashMap;

use pst_toolchain_spec_tables::{FieldDescriptor, LineGrammar};
use serde::Serialize;

pub use types::{Violation, check, validate};

/// Value reported for a field that has no token.
pub const MISSING: &str = "MISSING";
/// Name reported for a token no field accepted.
pub const UNDEFINED: &str = "UNDEFINED";

/// Whether a parsed variable carries a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// A token from the line.
    Value,
    /// No token; `value` is [`MISSING`].
    Missing,
}

/// One entry of a slot-filled line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedVariable {
    /// Field name, or [`UNDEFINED`].
    pub name: String,
    /// The raw token, or [`MISSING`].
    pub value: String,
    /// Constraint check result. Missing fields are valid; undefined tokens
    /// are not.
    pub valid: bool,
    /// 1 + the number of earlier entries on the line with the same value.
    pub occurrence_id: usize,
    /// Whether `value` is a real token.
    pub presence: Presence,
    /// Index of the token on its line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<usize>,
}

impl ParsedVariable {
    fn filled(name: &str, value: &str, valid: bool, token: usize) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            valid,
            occurrence_id: 0,
            presence: Presence::Value,
            token: Some(token),
        }
    }

    fn missing(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name.clone(),
            value: MISSING.to_string(),
            valid: true,
            occurrence_id: 0,
            presence: Presence::Missing,
            token: None,
        }
    }

    /// Whether this entry is a field without a token.
    pub fn is_missing(&self) -> bool {
        self.presence == Presence::Missing
    }

    /// Whether this entry is a token no field accepted.
    pub fn is_undefined(&self) -> bool {
        self.presence == Presence::Value && self.name == UNDEFINED
    }
}

/// Slot-fill one line against its grammar.
///
/// Output order: required fields, then the leftover tokens in line order
/// (claimed or undefined), then unclaimed optional fields. The number of
/// entries with [`Presence::Value`] always equals `tokens.len()`.
pub fn parse_line<S: AsRef<str>>(
    relative_index: usize,
    tokens: &[S],
    grammar: &LineGrammar,
) -> Vec<ParsedVariable> {
    let required = grammar.required();
    let optional = grammar.optional();
    let mut out = Vec::with_capacity(required.len() + optional.len() + tokens.len());

    for (i, field) in required.iter().enumerate() {
        out.push(match tokens.get(i) {
            Some(token) => {
                let token = token.as_ref();
                ParsedVariable::filled(&field.name, token, validate(token, field), i)
            }
            None => ParsedVariable::missing(field),
        });
    }

    let mut claimed = vec![false; optional.len()];
    for (i, token) in tokens.iter().enumerate().skip(required.len()) {
        let token = token.as_ref();
        let slot = optional
            .iter()
            .enumerate()
            .position(|(j, field)| !claimed[j] && validate(token, field));
        match slot {
            Some(j) => {
                claimed[j] = true;
                out.push(ParsedVariable::filled(&optional[j].name, token, true, i));
            }
            None => {
                log::trace!("line {relative_index}: token '{token}' matches no optional field");
                out.push(ParsedVariable::filled(UNDEFINED, token, false, i));
            }
        }
    }

    out.extend(
        optional
            .iter()
            .zip(&claimed)
            .filter(|(_, taken)| !**taken)
            .map(|(field, _)| ParsedVariable::missing(field)),
    );

    assign_occurrences(&mut out);
    out
}

fn assign_occurrences(vars: &mut [ParsedVariable]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for var in vars {
        let count = seen.entry(var.value.clone()).or_default();
        *count += 1;
        var.occurrence_id = *count;
    }
}

/// Find the entry for the `occurrence`-th appearance of `value` on a line.
pub fn find_occurrence<'a>(
    vars: &'a [ParsedVariable],
    value: &str,
    occurrence: usize,
) -> Option<&'a ParsedVariable> {
    vars.iter()
        .find(|v| v.presence == Presence::Value && v.value == value && v.occurrence_id == occurrence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grammar(fields: Vec<FieldDescriptor>) -> LineGrammar {
        LineGrammar::new("test", 0, fields).expect("valid test grammar")
    }

    fn summary(vars: &[ParsedVariable]) -> Vec<(String, String, bool)> {
        vars.iter()
            .map(|v| (v.name.clone(), v.value.clone(), v.valid))
            .collect()
    }

    fn row(name: &str, value: &str, valid: bool) -> (String, String, bool) {
        (name.to_string(), value.to_string(), valid)
    }

    #[test]
    fn required_fields_are_positional() {
        let g = grammar(vec![
            FieldDescriptor::integer("NPAR").min(1.0),
            FieldDescriptor::integer("NOBS").min(1.0),
        ]);
        let vars = parse_line(1, &["0", "5"], &g);
        assert_eq!(summary(&vars), [row("NPAR", "0", false), row("NOBS", "5", true)]);
    }

    #[test]
    fn missing_required_fields_are_valid_placeholders() {
        let g = grammar(vec![FieldDescriptor::integer("A"), FieldDescriptor::integer("B")]);
        let vars = parse_line(0, &["1"], &g);
        assert_eq!(summary(&vars), [row("A", "1", true), row("B", MISSING, true)]);
        assert!(vars[1].is_missing());
        assert_eq!(vars[1].token, None);
    }

    #[test]
    fn optional_first_fit_in_declared_order() {
        let g = grammar(vec![
            FieldDescriptor::integer("A").optional(),
            FieldDescriptor::choice("B", &["x"]).optional(),
        ]);
        let vars = parse_line(0, &["x"], &g);
        assert_eq!(summary(&vars), [row("B", "x", true), row("A", MISSING, true)]);
    }

    #[test]
    fn declared_order_wins_between_same_typed_optionals() {
        let g = grammar(vec![
            FieldDescriptor::float("P").optional(),
            FieldDescriptor::float("Q").optional(),
        ]);
        let vars = parse_line(0, &["2.0"], &g);
        assert_eq!(summary(&vars), [row("P", "2.0", true), row("Q", MISSING, true)]);
    }

    #[test]
    fn unmatched_tokens_are_undefined() {
        let g = grammar(vec![
            FieldDescriptor::integer("N"),
            FieldDescriptor::choice("M", &["on", "off"]).optional(),
        ]);
        let vars = parse_line(0, &["3", "maybe", "on"], &g);
        assert_eq!(
            summary(&vars),
            [row("N", "3", true), row(UNDEFINED, "maybe", false), row("M", "on", true)]
        );
        assert!(vars[1].is_undefined());
    }

    #[test]
    fn each_optional_is_claimed_once() {
        let g = grammar(vec![FieldDescriptor::integer("K").optional()]);
        let vars = parse_line(0, &["1", "2"], &g);
        assert_eq!(summary(&vars), [row("K", "1", true), row(UNDEFINED, "2", false)]);
    }

    #[test]
    fn token_count_is_conserved() {
        let g = grammar(vec![
            FieldDescriptor::integer("A"),
            FieldDescriptor::integer("B"),
            FieldDescriptor::float("C").optional(),
        ]);
        for tokens in [vec![], vec!["1"], vec!["1", "2"], vec!["1", "2", "3"], vec!["a", "b", "c", "d", "e"]] {
            let vars = parse_line(0, &tokens, &g);
            let with_value = vars.iter().filter(|v| v.presence == Presence::Value).count();
            assert_eq!(with_value, tokens.len(), "{tokens:?}");
        }
    }

    #[test]
    fn occurrence_ids_disambiguate_repeats() {
        let g = grammar(vec![
            FieldDescriptor::integer("ICOV"),
            FieldDescriptor::integer("ICOR"),
            FieldDescriptor::integer("IEIG"),
        ]);
        let vars = parse_line(7, &["1", "1", "0"], &g);
        let ids: Vec<usize> = vars.iter().map(|v| v.occurrence_id).collect();
        assert_eq!(ids, [1, 2, 1]);
        assert_eq!(find_occurrence(&vars, "1", 2).unwrap().name, "ICOR");
        assert!(find_occurrence(&vars, "1", 3).is_none());
    }

    #[test]
    fn missing_entries_count_their_own_occurrences() {
        let g = grammar(vec![
            FieldDescriptor::integer("A"),
            FieldDescriptor::integer("B"),
            FieldDescriptor::integer("C"),
        ]);
        let vars = parse_line(0, &["4"], &g);
        let ids: Vec<usize> = vars.iter().map(|v| v.occurrence_id).collect();
        assert_eq!(ids, [1, 1, 2]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let g = grammar(vec![
            FieldDescriptor::float("X"),
            FieldDescriptor::choice("Y", &["a", "b"]).optional(),
        ]);
        let tokens = ["1.5", "b", "zz"];
        assert_eq!(parse_line(0, &tokens, &g), parse_line(0, &tokens, &g));
    }

    #[test]
    fn a_literal_missing_token_is_still_a_value() {
        let g = grammar(vec![FieldDescriptor::text("NAME")]);
        let vars = parse_line(0, &["MISSING"], &g);
        assert_eq!(vars[0].presence, Presence::Value);
        assert!(!vars[0].is_missing());
    }
}
