//! Sample-based integration tests: lint the control files under `samples/`.

mod common;

use std::fs;

use pst_toolchain_core::{Document, GrammarTable, LintOptions, lint_document};

#[test]
fn lint_samples_directory() {
    let mut seen = 0;
    for entry in fs::read_dir(common::samples_dir()).expect("samples") {
        let path = entry.unwrap().path();
        if path.extension().and_then(|s| s.to_str()) != Some("pst") {
            continue;
        }
        let text = fs::read_to_string(&path).expect("read pst");
        let result = lint_document(&Document::new(&text), GrammarTable::builtin(), &LintOptions::default());
        assert!(result.ok, "lint failed for {path:?}: {:?}", result.issues);
        assert!(result.issues.is_empty(), "unexpected issues for {path:?}: {:?}", result.issues);
        seen += 1;
    }
    assert!(seen >= 2, "expected sample control files");
}

#[test]
fn crlf_copy_lints_the_same() {
    let text = common::read_sample("case.pst").replace('\n', "\r\n");
    let result = lint_document(&Document::new(&text), GrammarTable::builtin(), &LintOptions::default());
    assert!(result.issues.is_empty(), "{:?}", result.issues);
}

#[test]
fn broken_copy_reports_positions() {
    let text = common::read_sample("case.pst").replace("3 5 1 0 1", "3 five 1 0");
    let doc = Document::new(&text);
    let result = lint_document(&doc, GrammarTable::builtin(), &LintOptions::default());
    assert!(!result.ok);
    let ids: Vec<&str> = result.issues.iter().map(|d| d.id.as_ref()).collect();
    assert_eq!(ids, ["PST1001", "PST1002"]);
    let span = result.issues[1].span.expect("span");
    assert_eq!(&doc.text()[span.start..span.end], "five");
    assert_eq!(doc.line_index().line_col(span.start), (3, 2));
}
