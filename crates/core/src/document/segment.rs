use serde::Serialize;

/// Name given to the section opened by `++` option lines.
pub const EXTENSION_SECTION: &str = "++";

/// How a section was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// A `* name` header line.
    Named,
    /// A run of `++option(value)` lines.
    Extension,
    /// No markers anywhere: the whole document, outside any section.
    Implicit,
}

/// A contiguous range of lines opened by a header.
///
/// `start_line` is the header line itself; data lines are
/// `start_line + 1 ..= end_line`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Lowercased, trimmed header text after the `*` (or `++` for
    /// extension sections, empty for the implicit section).
    pub name: String,
    /// How the section was opened.
    pub kind: SectionKind,
    /// 0-based header line.
    pub start_line: usize,
    /// 0-based last line (inclusive).
    pub end_line: usize,
}

impl Section {
    /// Whether `line` falls inside this section, header included.
    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// Line index relative to the first data line, or `None` for the header
    /// line and lines outside the section.
    pub fn relative_index(&self, line: usize) -> Option<usize> {
        (self.contains(line) && line > self.start_line).then(|| line - self.start_line - 1)
    }

    /// Number of data lines after the header.
    pub fn data_lines(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Split a document into sections.
///
/// A line whose trimmed text starts with `*` opens a named section. A line
/// starting with `++` opens an extension section, or continues one that is
/// already open. Every section ends on the line before the next opener, and
/// the last one on the last line. Lines before the first header belong to no
/// section. A document with no openers yields one [`SectionKind::Implicit`]
/// section covering every line.
pub fn segment<S: AsRef<str>>(lines: &[S]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let last_line = lines.len().saturating_sub(1);

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.as_ref().trim();
        let opened = if let Some(rest) = trimmed.strip_prefix('*') {
            Some((rest.trim().to_lowercase(), SectionKind::Named))
        } else if trimmed.starts_with("++") {
            match sections.last() {
                Some(open) if open.kind == SectionKind::Extension => None,
                _ => Some((EXTENSION_SECTION.to_string(), SectionKind::Extension)),
            }
        } else {
            None
        };

        let Some((name, kind)) = opened else {
            continue;
        };
        if let Some(open) = sections.last_mut() {
            open.end_line = i - 1;
        }
        log::trace!("section '{name}' opens at line {i}");
        sections.push(Section {
            name,
            kind,
            start_line: i,
            end_line: last_line,
        });
    }

    if sections.is_empty() {
        sections.push(Section {
            name: String::new(),
            kind: SectionKind::Implicit,
            start_line: 0,
            end_line: last_line,
        });
    }
    sections
}

/// The section containing `line`, if any.
pub fn section_at(sections: &[Section], line: usize) -> Option<&Section> {
    let idx = sections.partition_point(|s| s.start_line <= line);
    sections[..idx].last().filter(|s| s.contains(line))
}
