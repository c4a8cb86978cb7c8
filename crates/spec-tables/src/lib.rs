//! Line-grammar tables for PEST control files.
//!
//! A [`GrammarTable`] maps a section name and a line index within that
//! section to an ordered list of [`FieldDescriptor`]s. Tables are loaded from
//! JSON and validated on construction, so a table that exists is well formed:
//! bounds are finite and ordered, required fields precede optional ones and
//! field names are unique per line.
//!
//! The built-in table is compiled from `spec/grammar.jsonc` and available
//! through [`GrammarTable::builtin`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Current format version for the grammar table JSON.
pub const TABLE_FORMAT_VERSION: &str = "1.0.0";

const BUILTIN_JSON: &str = include_str!(concat!(env!("OUT_DIR"), "/grammar.json"));

// ── Errors ──────────────────────────────────────────────────────────────

/// Reasons a grammar table is rejected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableError {
    /// The JSON could not be parsed into the table shape.
    #[error("invalid grammar table JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The table declares a format this crate does not read.
    #[error("unsupported grammar table format {found} (expected {expected})")]
    UnsupportedFormat {
        /// Version found in the table.
        found: String,
        /// Version this crate reads.
        expected: &'static str,
    },

    /// A field descriptor is malformed.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A required field is declared after an optional one.
    #[error("{section} line {line}: required field {field} follows an optional field")]
    RequiredAfterOptional {
        /// Section id.
        section: String,
        /// Line index within the section.
        line: usize,
        /// Offending field.
        field: String,
    },

    /// Two fields on one line share a name.
    #[error("{section} line {line}: field {field} is declared twice")]
    DuplicateField {
        /// Section id.
        section: String,
        /// Line index within the section.
        line: usize,
        /// Repeated field name.
        field: String,
    },

    /// A section name (or alias) is claimed by more than one section.
    #[error("section name '{name}' is declared twice")]
    DuplicateSection {
        /// Repeated name.
        name: String,
    },

    /// A section has nothing to match lines against.
    #[error("section {section} is empty: {reason}")]
    EmptySection {
        /// Section id.
        section: String,
        /// What is missing.
        reason: &'static str,
    },
}

// ── Field descriptors ───────────────────────────────────────────────────

/// Declared value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Base-10 integer.
    Integer,
    /// Real number.
    Float,
    /// Free text.
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
        })
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bounds {
    /// No bounds.
    pub const NONE: Bounds = Bounds {
        min: None,
        max: None,
    };

    /// Whether either bound is set.
    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Enumerated set of accepted tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    /// Accepted tokens. Stored lowercase when `case_insensitive` is set.
    pub values: Vec<String>,
    /// Compare after lowercasing the token.
    pub case_insensitive: bool,
    /// Declared type, kept for documentation.
    pub declared: ValueType,
    /// Declared bounds, kept for documentation. Membership alone decides
    /// validity.
    pub bounds: Bounds,
}

impl Choice {
    /// Whether `token` is one of the accepted values.
    pub fn accepts(&self, token: &str) -> bool {
        if self.case_insensitive {
            let lowered = token.to_lowercase();
            self.values.iter().any(|v| *v == lowered)
        } else {
            self.values.iter().any(|v| v == token)
        }
    }
}

/// What a field accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Base-10 integer within bounds.
    Integer(Bounds),
    /// Finite real number within bounds.
    Float(Bounds),
    /// Anything.
    Text,
    /// One of a fixed set of tokens.
    Choice(Choice),
}

/// One positional field of a control-file line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct FieldDescriptor {
    /// Field name as documented in the PEST manual (e.g. `NOPTMAX`).
    pub name: String,
    /// Whether the field must be present.
    pub required: bool,
    /// Accepted values.
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// A required integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer(Bounds::NONE))
    }

    /// A required float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float(Bounds::NONE))
    }

    /// A required free-text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// A required string field limited to `values`, compared exactly.
    pub fn choice(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Choice(Choice {
                values: values.iter().map(|v| (*v).to_string()).collect(),
                case_insensitive: false,
                declared: ValueType::String,
                bounds: Bounds::NONE,
            }),
        )
    }

    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            required: true,
            kind,
        }
    }

    /// Mark the field optional (builder pattern).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the inclusive lower bound (builder pattern). Ignored for text.
    pub fn min(mut self, min: f64) -> Self {
        if let Some(bounds) = self.bounds_mut() {
            bounds.min = Some(min);
        }
        self
    }

    /// Set the inclusive upper bound (builder pattern). Ignored for text.
    pub fn max(mut self, max: f64) -> Self {
        if let Some(bounds) = self.bounds_mut() {
            bounds.max = Some(max);
        }
        self
    }

    /// Compare choice values case-insensitively (builder pattern).
    pub fn ignore_case(mut self) -> Self {
        if let FieldKind::Choice(choice) = &mut self.kind {
            choice.case_insensitive = true;
            for value in &mut choice.values {
                *value = value.to_lowercase();
            }
        }
        self
    }

    fn bounds_mut(&mut self) -> Option<&mut Bounds> {
        match &mut self.kind {
            FieldKind::Integer(b) | FieldKind::Float(b) => Some(b),
            FieldKind::Choice(c) => Some(&mut c.bounds),
            FieldKind::Text => None,
        }
    }

    /// Declared value type.
    pub fn value_type(&self) -> ValueType {
        match &self.kind {
            FieldKind::Integer(_) => ValueType::Integer,
            FieldKind::Float(_) => ValueType::Float,
            FieldKind::Text => ValueType::String,
            FieldKind::Choice(c) => c.declared,
        }
    }

    /// Declared bounds (documentation only for choices).
    pub fn bounds(&self) -> Bounds {
        match &self.kind {
            FieldKind::Integer(b) | FieldKind::Float(b) => *b,
            FieldKind::Choice(c) => c.bounds,
            FieldKind::Text => Bounds::NONE,
        }
    }

    /// Accepted values, for choice fields.
    pub fn allowed_values(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::Choice(c) => Some(&c.values),
            _ => None,
        }
    }

    /// Short human-readable constraint, e.g. `integer >= 1` or
    /// `one of restart, norestart`.
    pub fn constraint_summary(&self) -> String {
        if let Some(values) = self.allowed_values() {
            return format!("one of {}", values.join(", "));
        }
        let ty = self.value_type();
        match self.bounds() {
            Bounds {
                min: Some(lo),
                max: Some(hi),
            } => format!("{ty} in [{lo}, {hi}]"),
            Bounds {
                min: Some(lo),
                max: None,
            } => format!("{ty} >= {lo}"),
            Bounds {
                min: None,
                max: Some(hi),
            } => format!("{ty} <= {hi}"),
            Bounds {
                min: None,
                max: None,
            } => ty.to_string(),
        }
    }
}

/// On-disk shape of a field descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    case_insensitive: bool,
}

impl TryFrom<RawField> for FieldDescriptor {
    type Error = TableError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let invalid = |reason: String| TableError::InvalidField {
            field: raw.name.clone(),
            reason,
        };

        if raw.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }
        for bound in [raw.min, raw.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(invalid(format!("bound {bound} is not finite")));
            }
        }
        if let (Some(lo), Some(hi)) = (raw.min, raw.max)
            && lo > hi
        {
            return Err(invalid(format!("min ({lo}) exceeds max ({hi})")));
        }
        let bounds = Bounds {
            min: raw.min,
            max: raw.max,
        };

        let kind = if !raw.allowed_values.is_empty() {
            let values = if raw.case_insensitive {
                raw.allowed_values.iter().map(|v| v.to_lowercase()).collect()
            } else {
                raw.allowed_values.clone()
            };
            FieldKind::Choice(Choice {
                values,
                case_insensitive: raw.case_insensitive,
                declared: raw.value_type,
                bounds,
            })
        } else if raw.case_insensitive {
            return Err(invalid("caseInsensitive requires allowedValues".into()));
        } else {
            match raw.value_type {
                ValueType::Integer => FieldKind::Integer(bounds),
                ValueType::Float => FieldKind::Float(bounds),
                ValueType::String if bounds.is_bounded() => {
                    return Err(invalid("string fields cannot have numeric bounds".into()));
                }
                ValueType::String => FieldKind::Text,
            }
        };

        Ok(FieldDescriptor {
            name: raw.name,
            required: raw.required,
            kind,
        })
    }
}

impl From<FieldDescriptor> for RawField {
    fn from(field: FieldDescriptor) -> Self {
        let value_type = field.value_type();
        let bounds = field.bounds();
        let (allowed_values, case_insensitive) = match field.kind {
            FieldKind::Choice(c) => (c.values, c.case_insensitive),
            _ => (Vec::new(), false),
        };
        RawField {
            name: field.name,
            value_type,
            required: field.required,
            allowed_values,
            min: bounds.min,
            max: bounds.max,
            case_insensitive,
        }
    }
}

// ── Line grammars ───────────────────────────────────────────────────────

/// Ordered fields of one line: all required fields, then all optional ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LineGrammar {
    fields: Vec<FieldDescriptor>,
    #[serde(skip)]
    split: usize,
}

impl LineGrammar {
    /// Build a line grammar, enforcing field order and unique names.
    ///
    /// `section` and `line` only label errors.
    pub fn new(
        section: &str,
        line: usize,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let mut optional_seen = false;
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(TableError::DuplicateField {
                    section: section.to_string(),
                    line,
                    field: field.name.clone(),
                });
            }
            if field.required && optional_seen {
                return Err(TableError::RequiredAfterOptional {
                    section: section.to_string(),
                    line,
                    field: field.name.clone(),
                });
            }
            optional_seen |= !field.required;
        }
        let split = fields.iter().take_while(|f| f.required).count();
        Ok(Self { fields, split })
    }

    /// All fields in declared order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Required fields, in positional order.
    pub fn required(&self) -> &[FieldDescriptor] {
        &self.fields[..self.split]
    }

    /// Optional fields, in trial order.
    pub fn optional(&self) -> &[FieldDescriptor] {
        &self.fields[self.split..]
    }

    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ── Sections ────────────────────────────────────────────────────────────

/// Which tokens of a file-list line are paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTokens {
    /// A command line: the tokens that look like paths, else the program.
    Command,
    /// Every token.
    All,
}

/// How the data lines of a section are read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
pub enum SectionLayout {
    /// Fixed lines, each with its own field list.
    Lines {
        /// Field list per relative line index.
        lines: Vec<LineGrammar>,
    },
    /// Tabular rows with positional column names and no validation.
    Columns {
        /// Column header names in order.
        columns: Vec<String>,
    },
    /// Lines listing model files or commands.
    Files {
        /// Which tokens are paths.
        tokens: FileTokens,
    },
}

/// One section of the control file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSpec {
    /// Stable identifier (e.g. `control_data`).
    pub id: String,
    /// Lowercase header names that open this section.
    pub names: Vec<String>,
    /// How the section's lines are read.
    #[serde(flatten)]
    pub layout: SectionLayout,
}

impl SectionSpec {
    /// Field list for a relative line index, for `Lines` sections.
    pub fn line(&self, relative_index: usize) -> Option<&LineGrammar> {
        match &self.layout {
            SectionLayout::Lines { lines } => lines.get(relative_index),
            _ => None,
        }
    }

    /// Number of fixed lines, for `Lines` sections.
    pub fn line_count(&self) -> Option<usize> {
        match &self.layout {
            SectionLayout::Lines { lines } => Some(lines.len()),
            _ => None,
        }
    }

    /// Column header at a token index, for `Columns` sections.
    pub fn column(&self, index: usize) -> Option<&str> {
        match &self.layout {
            SectionLayout::Columns { columns } => columns.get(index).map(String::as_str),
            _ => None,
        }
    }
}

// ── Raw (on-disk) table ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
    #[serde(default = "default_format_version")]
    format_version: String,
    sections: Vec<RawSection>,
}

#[derive(Deserialize)]
struct RawSection {
    id: String,
    names: Vec<String>,
    #[serde(flatten)]
    layout: RawLayout,
}

#[derive(Deserialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
enum RawLayout {
    Lines { lines: Vec<Vec<RawField>> },
    Columns { columns: Vec<String> },
    Files { tokens: FileTokens },
}

fn default_format_version() -> String {
    TABLE_FORMAT_VERSION.to_string()
}

// ── GrammarTable ────────────────────────────────────────────────────────

/// Every section layout the parser knows about.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarTable {
    /// Table format version.
    pub format_version: String,
    /// Sections in declaration order.
    pub sections: Vec<SectionSpec>,

    /// Section name → index into `sections` (built on first lookup).
    #[serde(skip)]
    name_map: OnceLock<HashMap<String, usize>>,
}

impl GrammarTable {
    /// Parse and validate a table from JSON.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let raw: RawTable = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// The table compiled into this crate.
    pub fn builtin() -> &'static GrammarTable {
        static TABLE: OnceLock<GrammarTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let table = GrammarTable::from_json(BUILTIN_JSON)
                .expect("embedded grammar table is validated by this crate's tests");
            log::debug!("loaded built-in grammar table ({} sections)", table.sections.len());
            table
        })
    }

    fn from_raw(raw: RawTable) -> Result<Self, TableError> {
        if raw.format_version.split('.').next() != TABLE_FORMAT_VERSION.split('.').next() {
            return Err(TableError::UnsupportedFormat {
                found: raw.format_version,
                expected: TABLE_FORMAT_VERSION,
            });
        }

        let mut names = HashSet::new();
        let mut sections = Vec::with_capacity(raw.sections.len());
        for section in raw.sections {
            if section.names.is_empty() {
                return Err(TableError::EmptySection {
                    section: section.id,
                    reason: "no header names",
                });
            }
            let aliases: Vec<String> = section
                .names
                .iter()
                .map(|n| normalize_name(n))
                .collect();
            for alias in &aliases {
                if !names.insert(alias.clone()) {
                    return Err(TableError::DuplicateSection {
                        name: alias.clone(),
                    });
                }
            }

            let layout = match section.layout {
                RawLayout::Lines { lines } => {
                    if lines.is_empty() {
                        return Err(TableError::EmptySection {
                            section: section.id,
                            reason: "no lines",
                        });
                    }
                    let lines = lines
                        .into_iter()
                        .enumerate()
                        .map(|(i, fields)| {
                            let fields = fields
                                .into_iter()
                                .map(FieldDescriptor::try_from)
                                .collect::<Result<Vec<_>, _>>()?;
                            LineGrammar::new(&section.id, i, fields)
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    SectionLayout::Lines { lines }
                }
                RawLayout::Columns { columns } => {
                    if columns.is_empty() {
                        return Err(TableError::EmptySection {
                            section: section.id,
                            reason: "no columns",
                        });
                    }
                    SectionLayout::Columns { columns }
                }
                RawLayout::Files { tokens } => SectionLayout::Files { tokens },
            };

            sections.push(SectionSpec {
                id: section.id,
                names: aliases,
                layout,
            });
        }

        Ok(Self {
            format_version: raw.format_version,
            sections,
            name_map: OnceLock::new(),
        })
    }

    fn name_map(&self) -> &HashMap<String, usize> {
        self.name_map.get_or_init(|| {
            let mut m = HashMap::new();
            for (i, s) in self.sections.iter().enumerate() {
                for name in &s.names {
                    m.insert(name.clone(), i);
                }
            }
            m
        })
    }

    /// Section whose header text is `name` (case and surrounding whitespace
    /// are ignored).
    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.name_map()
            .get(&normalize_name(name))
            .map(|&i| &self.sections[i])
    }
}

/// Lowercase and trim a section header name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
