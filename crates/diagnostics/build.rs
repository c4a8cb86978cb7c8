//! Generates diagnostic lookup code from `spec/diagnostics.jsonc`.
//!
//! Output files in `OUT_DIR`:
//! - `generated_codes.rs`: one `pub const NAME: &str = "PSTnnnn";` per entry
//! - `generated_catalog.rs`: `ALL_CODES` in catalogue order
//! - `generated_explain.rs`: id → long description
//! - `generated_severity.rs`: id → default severity
//! - `generated_templates.rs`: (id, variant) → message template

use std::collections::{BTreeSet, HashSet};
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use pst_toolchain_jsonc_strip::strip_jsonc;

struct Entry {
    id: String,
    const_name: String,
    severity: &'static str,
    summary: String,
    description: String,
    templates: Vec<(String, String)>,
}

fn main() {
    let spec_path = Path::new("spec/diagnostics.jsonc");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let raw = fs::read_to_string(spec_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", spec_path.display()));
    let spec: serde_json::Value = serde_json::from_str(&strip_jsonc(&raw))
        .unwrap_or_else(|e| panic!("{}: invalid JSON: {e}", spec_path.display()));
    let entries = read_entries(&spec);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let out = Path::new(&out_dir);
    let header = "// Generated from spec/diagnostics.jsonc. Do not edit.\n\n";

    let mut codes = String::from(header);
    let mut catalog = String::from(header);
    let mut explain = String::from("match id {\n");
    let mut severity = String::from("match id {\n");
    let mut templates = String::from("match (id, variant) {\n");

    catalog.push_str("/// Every diagnostic id, in catalogue order.\npub const ALL_CODES: &[&str] = &[\n");
    for e in &entries {
        let _ = writeln!(codes, "/// {}\npub const {}: &str = \"{}\";\n", e.summary, e.const_name, e.id);
        let _ = writeln!(catalog, "    \"{}\",", e.id);
        let _ = writeln!(explain, "    \"{}\" => Some(\"{}\"),", e.id, escape(&e.description));
        let _ = writeln!(severity, "    \"{}\" => Some({}),", e.id, e.severity);
        for (variant, template) in &e.templates {
            let _ = writeln!(
                templates,
                "    (\"{}\", \"{}\") => Some(\"{}\"),",
                e.id,
                variant,
                escape(template)
            );
        }
    }
    catalog.push_str("];\n");
    for buf in [&mut explain, &mut severity, &mut templates] {
        buf.push_str("    _ => None,\n}\n");
    }

    for (name, body) in [
        ("generated_codes.rs", &codes),
        ("generated_catalog.rs", &catalog),
        ("generated_explain.rs", &explain),
        ("generated_severity.rs", &severity),
        ("generated_templates.rs", &templates),
    ] {
        fs::write(out.join(name), body).unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    }
}

fn read_entries(spec: &serde_json::Value) -> Vec<Entry> {
    let list = spec["diagnostics"]
        .as_array()
        .expect("diagnostics.jsonc: expected a `diagnostics` array");

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut entries = Vec::with_capacity(list.len());

    for (i, item) in list.iter().enumerate() {
        let text = |key: &str| -> String {
            item[key]
                .as_str()
                .unwrap_or_else(|| panic!("diagnostics[{i}]: missing string `{key}`"))
                .to_string()
        };
        let id = text("id");
        let const_name = text("constName");

        assert!(
            id.len() == 7 && id.starts_with("PST") && id[3..].bytes().all(|b| b.is_ascii_digit()),
            "diagnostics[{i}]: id '{id}' must look like PSTnnnn"
        );
        assert!(
            const_name.starts_with(|c: char| c.is_ascii_uppercase())
                && const_name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'),
            "{id}: constName '{const_name}' must be SCREAMING_SNAKE_CASE"
        );
        assert!(seen_ids.insert(id.clone()), "{id}: duplicate id");
        assert!(seen_names.insert(const_name.clone()), "{id}: duplicate constName");

        let severity = match text("severity").as_str() {
            "error" => "Severity::Error",
            "warn" => "Severity::Warn",
            "info" => "Severity::Info",
            "hint" => "Severity::Hint",
            other => panic!("{id}: unknown severity '{other}'"),
        };

        let context_keys: BTreeSet<String> = item["contextKeys"]
            .as_array()
            .unwrap_or_else(|| panic!("{id}: missing `contextKeys` array"))
            .iter()
            .map(|k| {
                k.as_str()
                    .unwrap_or_else(|| panic!("{id}: contextKeys entries must be strings"))
                    .to_string()
            })
            .collect();

        let mut templates = Vec::new();
        if let Some(map) = item["messageTemplates"].as_object() {
            for (variant, template) in map {
                let template = template
                    .as_str()
                    .unwrap_or_else(|| panic!("{id}: messageTemplates.{variant} must be a string"));
                for key in placeholders(template) {
                    assert!(
                        context_keys.contains(&key),
                        "{id}: messageTemplates.{variant} uses '{{{key}}}' which is not in contextKeys"
                    );
                }
                templates.push((variant.clone(), template.to_string()));
            }
        }

        entries.push(Entry {
            summary: text("summary"),
            description: text("description"),
            id,
            const_name,
            severity,
            templates,
        });
    }
    entries
}

fn escape(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}

fn placeholders(template: &str) -> Vec<String> {
    template
        .split('{')
        .skip(1)
        .filter_map(|rest| rest.split_once('}'))
        .map(|(key, _)| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}
