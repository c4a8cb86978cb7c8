//! PEST control file toolchain core library.
//!
//! Splits a `.pst` document into sections, assigns the tokens of each fixed
//! line to named fields, and reports what does not fit. The main entry
//! points are [`analyze`] for a per-line reading, [`lint_document`] for coded
//! diagnostics and [`lookup`] for resolving the token under a cursor.

#![warn(missing_docs)]

/// Field-description tables.
pub mod describe;
/// Section-to-grammar dispatch and whole-document analysis.
pub mod dispatch;
/// Normalized documents, tokens and sections.
pub mod document;
/// `++` option lines.
pub mod extension;
/// Model file references.
pub mod files;
/// Coded diagnostics over slot-filling results.
pub mod lint;
/// Cursor lookup.
pub mod lookup;
/// Slot filling and token validation.
pub mod slots;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Documents
pub use document::Document;
pub use document::segment::{Section, SectionKind, segment};

// Parsing
pub use dispatch::{Analysis, LineAnalysis, LineContent, analyze};
pub use slots::{MISSING, ParsedVariable, Presence, UNDEFINED, parse_line, validate};

// Linting
pub use lint::{LintOptions, LintResult, lint_document};

// Lookup
pub use describe::{Description, DescriptionTable, DescribeError};
pub use lookup::{Target, lookup};

// Diagnostics (re-exported from the diagnostics crate)
pub use pst_toolchain_diagnostics::{Diagnostic, Severity, Span, codes};

// Tables (re-exported from the spec-tables crate)
pub use pst_toolchain_spec_tables::{FieldDescriptor, GrammarTable, LineGrammar};
