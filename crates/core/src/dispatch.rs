//! Section-to-grammar dispatch.
//!
//! Walks the document's lines with a two-state machine: before the first
//! header nothing is parsed; inside a section each data line is classified
//! by the section's layout in the grammar table. Lines with no table entry
//! fall through to [`LineClass::Unstructured`].

use pst_toolchain_spec_tables::{FileTokens, GrammarTable, LineGrammar, SectionLayout, SectionSpec};
use serde::Serialize;

use crate::document::Document;
use crate::document::segment::{Section, SectionKind};
use crate::extension::{ExtensionOption, parse_options};
use crate::files::path_tokens;
use crate::slots::{ParsedVariable, parse_line};

/// How one line of the document is read.
#[derive(Debug, Clone, Copy)]
pub enum LineClass<'t> {
    /// Outside every section.
    Preamble,
    /// The header line of a named section.
    Header {
        /// Index into the section list.
        section: usize,
    },
    /// A fixed line with a field list.
    Fields {
        /// Index into the section list.
        section: usize,
        /// Line index after the header.
        relative_index: usize,
        /// Fields for this line.
        grammar: &'t LineGrammar,
    },
    /// A row of a tabular section.
    Columns {
        /// Index into the section list.
        section: usize,
        /// The section's layout.
        spec: &'t SectionSpec,
    },
    /// A line of a file-list section.
    Files {
        /// Index into the section list.
        section: usize,
        /// Which tokens are paths.
        tokens: FileTokens,
    },
    /// A line of a `++` option block, the opening line included.
    Extension {
        /// Index into the section list.
        section: usize,
    },
    /// Inside a section, but without a table entry.
    Unstructured {
        /// Index into the section list.
        section: usize,
    },
}

enum State<'t> {
    NoSection,
    InSection {
        index: usize,
        spec: Option<&'t SectionSpec>,
    },
}

/// Classify every line of a document.
///
/// `sections` must come from segmenting the same document.
pub fn classify<'t>(
    sections: &[Section],
    line_count: usize,
    table: &'t GrammarTable,
) -> Vec<LineClass<'t>> {
    let mut classes = Vec::with_capacity(line_count);
    let mut state = State::NoSection;
    let mut next = 0usize;

    for line in 0..line_count {
        if let Some(section) = sections.get(next)
            && section.start_line == line
        {
            let spec = match section.kind {
                SectionKind::Named => table.section(&section.name),
                SectionKind::Extension | SectionKind::Implicit => None,
            };
            if section.kind == SectionKind::Named && spec.is_none() {
                log::debug!("no layout for section '{}'", section.name);
            }
            state = State::InSection { index: next, spec };
            next += 1;
            match section.kind {
                SectionKind::Named => {
                    classes.push(LineClass::Header { section: next - 1 });
                    continue;
                }
                // The opening `++` line carries options of its own.
                SectionKind::Extension => {
                    classes.push(LineClass::Extension { section: next - 1 });
                    continue;
                }
                SectionKind::Implicit => {}
            }
        }

        let class = match state {
            State::NoSection => LineClass::Preamble,
            State::InSection { index, spec } => {
                let section = &sections[index];
                match section.kind {
                    SectionKind::Implicit => LineClass::Preamble,
                    SectionKind::Extension => LineClass::Extension { section: index },
                    SectionKind::Named => {
                        let relative_index = line - section.start_line - 1;
                        classify_data_line(index, relative_index, spec)
                    }
                }
            }
        };
        classes.push(class);
    }
    classes
}

fn classify_data_line<'t>(
    section: usize,
    relative_index: usize,
    spec: Option<&'t SectionSpec>,
) -> LineClass<'t> {
    let Some(spec) = spec else {
        return LineClass::Unstructured { section };
    };
    match &spec.layout {
        SectionLayout::Lines { lines } => match lines.get(relative_index) {
            Some(grammar) => LineClass::Fields {
                section,
                relative_index,
                grammar,
            },
            None => LineClass::Unstructured { section },
        },
        SectionLayout::Columns { .. } => LineClass::Columns { section, spec },
        SectionLayout::Files { tokens } => LineClass::Files {
            section,
            tokens: *tokens,
        },
    }
}

// ── Whole-document analysis ────────────────────────────────────────────

/// A cell of a tabular row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Column header, when the row is no wider than the overlay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// The token.
    pub value: String,
}

/// What was found on one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineContent {
    /// Outside every section.
    Preamble,
    /// A section header.
    Header,
    /// Slot-filled fields.
    #[serde(rename_all = "camelCase")]
    Fields {
        /// Line index after the header.
        relative_index: usize,
        /// Slot-filling result.
        variables: Vec<ParsedVariable>,
    },
    /// Tokens labelled with column headers.
    Columns {
        /// One entry per token.
        cells: Vec<Cell>,
    },
    /// File paths or commands.
    Files {
        /// Tokens read as paths.
        paths: Vec<String>,
    },
    /// `++` options.
    Extension {
        /// Options on the line.
        options: Vec<ExtensionOption>,
    },
    /// No layout applies.
    Unstructured,
}

/// Analysis of one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAnalysis {
    /// 0-based line.
    pub line: usize,
    /// Name of the enclosing section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// What the line holds.
    #[serde(flatten)]
    pub content: LineContent,
}

/// Sections plus a per-line reading of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Sections in document order.
    pub sections: Vec<Section>,
    /// One entry per line.
    pub lines: Vec<LineAnalysis>,
}

impl Analysis {
    /// Slot-filled variables of `line`, if it is a field line.
    pub fn variables(&self, line: usize) -> Option<&[ParsedVariable]> {
        match &self.lines.get(line)?.content {
            LineContent::Fields { variables, .. } => Some(variables),
            _ => None,
        }
    }
}

/// Segment, classify and parse every line of `doc`.
pub fn analyze(doc: &Document, table: &GrammarTable) -> Analysis {
    let sections = doc.sections();
    let classes = classify(&sections, doc.line_count(), table);

    let lines = classes
        .iter()
        .enumerate()
        .map(|(line, class)| {
            let tokens = doc.tokens(line);
            let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
            let (section, content) = match *class {
                LineClass::Preamble => (None, LineContent::Preamble),
                LineClass::Header { section } => (Some(section), LineContent::Header),
                LineClass::Fields {
                    section,
                    relative_index,
                    grammar,
                } => (
                    Some(section),
                    LineContent::Fields {
                        relative_index,
                        variables: parse_line(relative_index, &texts, grammar),
                    },
                ),
                LineClass::Columns { section, spec } => (
                    Some(section),
                    LineContent::Columns {
                        cells: texts
                            .iter()
                            .enumerate()
                            .map(|(i, text)| Cell {
                                column: spec.column(i).map(str::to_string),
                                value: (*text).to_string(),
                            })
                            .collect(),
                    },
                ),
                LineClass::Files { section, tokens } => (
                    Some(section),
                    LineContent::Files {
                        paths: path_tokens(tokens, &texts)
                            .into_iter()
                            .map(|i| texts[i].to_string())
                            .collect(),
                    },
                ),
                LineClass::Extension { section } => (
                    Some(section),
                    LineContent::Extension {
                        options: doc.line(line).map(parse_options).unwrap_or_default(),
                    },
                ),
                LineClass::Unstructured { section } => (Some(section), LineContent::Unstructured),
            };
            LineAnalysis {
                line,
                section: section.map(|i| sections[i].name.clone()),
                content,
            }
        })
        .collect();

    Analysis { sections, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::UNDEFINED;

    fn kinds(doc: &str) -> Vec<&'static str> {
        let doc = Document::new(doc);
        let sections = doc.sections();
        classify(&sections, doc.line_count(), GrammarTable::builtin())
            .iter()
            .map(|c| match c {
                LineClass::Preamble => "preamble",
                LineClass::Header { .. } => "header",
                LineClass::Fields { .. } => "fields",
                LineClass::Columns { .. } => "columns",
                LineClass::Files { .. } => "files",
                LineClass::Extension { .. } => "extension",
                LineClass::Unstructured { .. } => "unstructured",
            })
            .collect()
    }

    #[test]
    fn classifies_by_section_layout() {
        let k = kinds(
            "pcf\n* svd\n1\n5 1e-6\n1\nextra\n* parameter data\np1 log factor 1 0.1 10 g 1 0 1\n* model command line\nrun.bat\n* prior information\npi1 1.0\n++ies_num_reals(10)",
        );
        assert_eq!(
            k,
            [
                "preamble", "header", "fields", "fields", "fields", "unstructured", "header",
                "columns", "header", "files", "header", "unstructured", "extension"
            ]
        );
    }

    #[test]
    fn no_markers_means_all_preamble() {
        assert_eq!(kinds("restart estimation\n1 2"), ["preamble", "preamble"]);
    }

    #[test]
    fn extension_block_includes_its_opener() {
        assert_eq!(
            kinds("* svd\n1\n++a(1)\n++b(2)\n"),
            ["header", "fields", "extension", "extension", "extension"]
        );
    }

    #[test]
    fn analyze_keeps_options_on_the_opening_line() {
        let doc = Document::new("* svd\n1\n++ies_num_reals(50) ++ies_bad_phi(1.0e20)\n++b(2)\n");
        let analysis = analyze(&doc, GrammarTable::builtin());
        let LineContent::Extension { options } = &analysis.lines[2].content else {
            panic!("expected options on line 2");
        };
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["ies_num_reals", "ies_bad_phi"]);
        assert_eq!(options[1].value.as_deref(), Some("1.0e20"));
        assert_eq!(analysis.lines[2].section.as_deref(), Some("++"));
    }

    #[test]
    fn analyze_parses_field_lines() {
        let doc = Document::new("pcf\n* control data\nrestart bogus\n");
        let analysis = analyze(&doc, GrammarTable::builtin());
        let vars = analysis.variables(2).expect("field line");
        assert_eq!(vars[0].name, "RSTFLE");
        assert!(vars[0].valid);
        assert_eq!(vars[1].name, "PESTMODE");
        assert!(!vars[1].valid);
        assert_eq!(analysis.lines[2].section.as_deref(), Some("control data"));
        assert!(analysis.variables(1).is_none());
    }

    #[test]
    fn analyze_labels_columns() {
        let doc = Document::new("* observation groups\nheads 0.5 cov.txt extra\n");
        let analysis = analyze(&doc, GrammarTable::builtin());
        let LineContent::Columns { cells } = &analysis.lines[1].content else {
            panic!("expected columns");
        };
        assert_eq!(cells[0].column.as_deref(), Some("OBGNME"));
        assert_eq!(cells[2].column.as_deref(), Some("COVFILE"));
        assert_eq!(cells[3].column, None);
    }

    #[test]
    fn analyze_reports_undefined_tokens() {
        let doc = Document::new("* svd\n1 extra\n");
        let analysis = analyze(&doc, GrammarTable::builtin());
        let vars = analysis.variables(1).unwrap();
        assert_eq!(vars[1].name, UNDEFINED);
    }

    #[test]
    fn analysis_serializes_with_kind_tags() {
        let doc = Document::new("* svd\n1\n");
        let json = serde_json::to_value(analyze(&doc, GrammarTable::builtin())).unwrap();
        assert_eq!(json["lines"][0]["kind"], "header");
        assert_eq!(json["lines"][1]["kind"], "fields");
        assert_eq!(json["lines"][1]["relativeIndex"], 0);
        assert_eq!(json["lines"][1]["variables"][0]["name"], "SVDMODE");
        assert_eq!(json["sections"][0]["startLine"], 0);
    }
}
