//! Resolve the token under a cursor to what it means.

use pst_toolchain_spec_tables::{FieldDescriptor, GrammarTable};
use serde::Serialize;

use crate::dispatch::{LineClass, classify};
use crate::document::Document;
use crate::document::lexer::Token;
use crate::extension::{ExtensionOption, option_at};
use crate::files::path_tokens;
use crate::slots::{ParsedVariable, find_occurrence, parse_line};

/// What sits under a cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Target {
    /// A token assigned to a declared field.
    Field {
        /// Enclosing section name.
        section: String,
        /// Slot-filling entry for the token.
        variable: ParsedVariable,
        /// The field's declaration.
        descriptor: FieldDescriptor,
    },
    /// A token no field on its line accepted.
    Undefined {
        /// Enclosing section name.
        section: String,
        /// Slot-filling entry for the token.
        variable: ParsedVariable,
    },
    /// A cell of a tabular section.
    Column {
        /// Enclosing section name.
        section: String,
        /// Column header name.
        column: String,
        /// The token.
        value: String,
    },
    /// A `++name(value)` option.
    Extension {
        /// The option.
        option: ExtensionOption,
    },
    /// A path in a file-list section.
    File {
        /// Enclosing section name.
        section: String,
        /// The path as written.
        path: String,
    },
}

impl Target {
    /// The name to look up in a description table.
    pub fn lookup_name(&self) -> &str {
        match self {
            Target::Field { variable, .. } | Target::Undefined { variable, .. } => &variable.name,
            Target::Column { column, .. } => column,
            Target::Extension { option } => &option.name,
            Target::File { path, .. } => path,
        }
    }
}

/// Resolve the token at 0-based `line` and byte column `col`.
///
/// Repeated identical tokens on a field line are told apart by counting how
/// many copies precede the cursor and matching that against each parsed
/// variable's occurrence id.
pub fn lookup(doc: &Document, table: &GrammarTable, line: usize, col: usize) -> Option<Target> {
    let text = doc.line(line)?;
    let sections = doc.sections();
    let class = *classify(&sections, doc.line_count(), table).get(line)?;

    if let LineClass::Extension { .. } = class
        && let Some(option) = option_at(text, col)
    {
        return Some(Target::Extension { option });
    }

    let tokens = doc.tokens(line);
    let index = tokens.iter().position(|t| t.touches(col))?;
    let word = tokens[index].text;
    let section_name = |i: usize| sections[i].name.clone();

    match class {
        LineClass::Fields {
            section,
            relative_index,
            grammar,
        } => {
            let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
            let vars = parse_line(relative_index, &texts, grammar);
            let occurrence = occurrence_of(&tokens, index);
            let variable = find_occurrence(&vars, word, occurrence)?.clone();
            let section = section_name(section);
            Some(match grammar.field(&variable.name) {
                Some(descriptor) => Target::Field {
                    section,
                    variable,
                    descriptor: descriptor.clone(),
                },
                None => Target::Undefined { section, variable },
            })
        }
        LineClass::Columns { section, spec } => Some(Target::Column {
            section: section_name(section),
            column: spec.column(index)?.to_string(),
            value: word.to_string(),
        }),
        LineClass::Files { section, tokens: mode } => {
            let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
            if !path_tokens(mode, &texts).contains(&index) {
                return None;
            }
            Some(Target::File {
                section: section_name(section),
                path: word.to_string(),
            })
        }
        _ => None,
    }
}

/// 1-based occurrence of `tokens[index]` among identical tokens before it.
fn occurrence_of(tokens: &[Token<'_>], index: usize) -> usize {
    let word = tokens[index].text;
    1 + tokens[..index].iter().filter(|t| t.text == word).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PST: &str = "\
pcf
* control data
restart estimation
5 10 2 0 3
2 3 single point 1 0 0
5.0 2.0 0.3 0.03 10
10.0 10.0 0.001
0.1
30 0.005 4 4 0.005 4
1 1 1
* parameter groups
g relative 0.01 0.0 switch 2.0 parabolic
* model input/output
model.tpl model.in
++ies_num_reals(50)
";

    fn at(line: usize, col: usize) -> Option<Target> {
        lookup(&Document::new(PST), GrammarTable::builtin(), line, col)
    }

    #[test]
    fn resolves_field_under_cursor() {
        let Some(Target::Field { variable, descriptor, section }) = at(2, 10) else {
            panic!("expected a field");
        };
        assert_eq!(section, "control data");
        assert_eq!(variable.name, "PESTMODE");
        assert_eq!(descriptor.name, "PESTMODE");
    }

    #[test]
    fn repeated_values_resolve_to_the_right_field() {
        // "1 1 1" on the ICOV/ICOR/IEIG line
        let names: Vec<String> = [0, 2, 4]
            .iter()
            .map(|&col| match at(9, col) {
                Some(Target::Field { variable, .. }) => variable.name,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(names, ["ICOV", "ICOR", "IEIG"]);
    }

    #[test]
    fn optional_fields_resolve_by_type() {
        // "2 3 single point 1 0 0": NUMCOM, JACFILE, MESSFILE
        let Some(Target::Field { variable, .. }) = at(4, 20) else {
            panic!("expected a field");
        };
        assert_eq!(variable.name, "JACFILE");
        assert_eq!(variable.occurrence_id, 1);
    }

    #[test]
    fn undefined_tokens_are_reported() {
        let doc = Document::new("* svd\n1 zz\n");
        let target = lookup(&doc, GrammarTable::builtin(), 1, 3).unwrap();
        assert!(matches!(target, Target::Undefined { .. }));
        assert_eq!(target.lookup_name(), "UNDEFINED");
    }

    #[test]
    fn columns_use_the_header_overlay() {
        let Some(Target::Column { column, value, .. }) = at(11, 2) else {
            panic!("expected a column");
        };
        assert_eq!(column, "INCTYP");
        assert_eq!(value, "relative");
    }

    #[test]
    fn files_and_extension_options() {
        assert!(matches!(at(13, 12), Some(Target::File { ref path, .. }) if path == "model.in"));
        let Some(Target::Extension { option }) = at(14, 5) else {
            panic!("expected an option");
        };
        assert_eq!(option.name, "ies_num_reals");
    }

    #[test]
    fn command_lines_resolve_the_script_not_the_interpreter() {
        let doc = Document::new("* model command line\npython run.py --fast\n");
        let table = GrammarTable::builtin();
        assert!(lookup(&doc, table, 1, 2).is_none());
        assert!(matches!(
            lookup(&doc, table, 1, 9),
            Some(Target::File { ref path, .. }) if path == "run.py"
        ));
        assert!(lookup(&doc, table, 1, 16).is_none());
    }

    #[test]
    fn headers_and_preamble_resolve_to_nothing() {
        assert!(at(0, 1).is_none());
        assert!(at(1, 3).is_none());
        assert!(at(99, 0).is_none());
    }
}
