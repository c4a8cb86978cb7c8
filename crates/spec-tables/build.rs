//! Compiles `spec/grammar.jsonc` into `OUT_DIR/grammar.json`.
//!
//! Only structural checks run here (known layouts, unique section ids and
//! names, non-empty field lists). Field-level rules are enforced by
//! `GrammarTable::from_json`, which the crate's tests run against the
//! embedded copy.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

use pst_toolchain_jsonc_strip::strip_jsonc;

fn main() {
    let src = Path::new("spec/grammar.jsonc");
    println!("cargo:rerun-if-changed={}", src.display());

    let raw = fs::read_to_string(src)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", src.display()));
    let table: serde_json::Value = serde_json::from_str(&strip_jsonc(&raw))
        .unwrap_or_else(|e| panic!("{}: invalid JSON: {e}", src.display()));

    check(&table);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let compact = serde_json::to_string(&table).expect("re-serializing a parsed value");
    fs::write(Path::new(&out_dir).join("grammar.json"), compact)
        .expect("failed to write grammar.json");
}

fn check(table: &serde_json::Value) {
    let sections = table["sections"]
        .as_array()
        .expect("grammar.jsonc: expected a `sections` array");
    assert!(!sections.is_empty(), "grammar.jsonc: no sections");

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for (i, section) in sections.iter().enumerate() {
        let id = section["id"]
            .as_str()
            .unwrap_or_else(|| panic!("sections[{i}]: missing `id`"));
        assert!(ids.insert(id), "sections[{i}]: duplicate id '{id}'");

        let aliases = section["names"]
            .as_array()
            .unwrap_or_else(|| panic!("{id}: missing `names`"));
        assert!(!aliases.is_empty(), "{id}: `names` is empty");
        for alias in aliases {
            let alias = alias
                .as_str()
                .unwrap_or_else(|| panic!("{id}: names must be strings"));
            assert!(
                alias == alias.trim().to_lowercase(),
                "{id}: section name '{alias}' must be lowercase and trimmed"
            );
            assert!(names.insert(alias), "{id}: section name '{alias}' is used twice");
        }

        match section["layout"].as_str() {
            Some("lines") => {
                let lines = section["lines"]
                    .as_array()
                    .unwrap_or_else(|| panic!("{id}: `lines` layout needs a `lines` array"));
                for (n, line) in lines.iter().enumerate() {
                    let fields = line
                        .as_array()
                        .unwrap_or_else(|| panic!("{id} line {n}: expected an array of fields"));
                    assert!(!fields.is_empty(), "{id} line {n}: no fields");
                }
            }
            Some("columns") => {
                let columns = section["columns"]
                    .as_array()
                    .unwrap_or_else(|| panic!("{id}: `columns` layout needs a `columns` array"));
                assert!(!columns.is_empty(), "{id}: no columns");
            }
            Some("files") => {}
            other => panic!("{id}: unknown layout {other:?}"),
        }
    }
}
