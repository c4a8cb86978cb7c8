mod render;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pst_toolchain_checker::{ReportContext, parse_report, suppressible_checks};
use pst_toolchain_config::{Settings, load_settings};
use pst_toolchain_core::files::{FileReference, file_references, resolve};
use pst_toolchain_core::{
    Description, DescriptionTable, Document, LintOptions, SectionKind, Target, analyze,
    lint_document, lookup,
};
use pst_toolchain_diagnostics::{self as diag, Diagnostic, Severity};
use pst_toolchain_spec_tables::GrammarTable;
use serde::Serialize;

use crate::render::{Format, print_files, print_findings, print_summary, render_diagnostics};

/// Settings file picked up from the working directory when `--config` is absent.
const DEFAULT_SETTINGS_FILE: &str = "pst.json";

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pst",
    version,
    about = "PEST control file toolchain: segment, parse and lint .pst files, and read PESTCHEK output"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Settings file. Defaults to `pst.json` in the working directory, if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Control file commands ────────────────────────────────────────
    /// List the sections of a control file.
    Sections {
        /// Control file, or `-` for stdin.
        file: String,
    },

    /// Print the per-line analysis of a control file as JSON.
    Parse {
        /// Control file, or `-` for stdin.
        file: String,
        /// Grammar table JSON replacing the built-in one.
        #[arg(long)]
        grammar: Option<PathBuf>,
    },

    /// Lint a control file. Exits 1 when any error is reported.
    #[command(alias = "check")]
    Lint {
        /// Control file, or `-` for stdin.
        file: String,
        /// Grammar table JSON replacing the built-in one.
        #[arg(long)]
        grammar: Option<PathBuf>,
    },

    /// Show the field under a cursor position, with its description.
    Describe {
        /// Control file.
        file: String,
        /// 1-based line.
        #[arg(long)]
        line: usize,
        /// 1-based character column.
        #[arg(long)]
        column: usize,
        /// Field-description table (CSV).
        #[arg(long)]
        descriptions: Option<PathBuf>,
        /// Grammar table JSON replacing the built-in one.
        #[arg(long)]
        grammar: Option<PathBuf>,
    },

    /// List the model files a control file names, resolved against its
    /// directory.
    Files {
        /// Control file.
        file: String,
        /// Grammar table JSON replacing the built-in one.
        #[arg(long)]
        grammar: Option<PathBuf>,
    },

    // ── Checker output ───────────────────────────────────────────────
    /// Turn PESTCHEK output into findings grouped by file. Exits 1 when
    /// any error is reported.
    Report {
        /// Saved PESTCHEK output, or `-` for stdin.
        file: String,
        /// Control file PESTCHEK was run on.
        #[arg(long)]
        pst: PathBuf,
        /// Directory relative paths in the output resolve against.
        /// Defaults to the settings' `workspace_root`, then the working directory.
        #[arg(long)]
        root: Option<PathBuf>,
    },

    // ── Reference ────────────────────────────────────────────────────
    /// Explain a diagnostic ID (e.g. PST1001).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli, format) {
        match format {
            Format::Json => {
                let out = serde_json::json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                });
                println!("{out:#}");
            }
            Format::Pretty => eprintln!("error: {err:#}"),
        }
        process::exit(1);
    }
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let settings = resolve_settings(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Sections { file } => cmd_sections(&file, format),
        Cmd::Parse { file, grammar } => cmd_parse(&file, grammar.as_deref(), &settings),
        Cmd::Lint { file, grammar } => cmd_lint(&file, grammar.as_deref(), &settings, format),
        Cmd::Describe {
            file,
            line,
            column,
            descriptions,
            grammar,
        } => cmd_describe(
            &file,
            (line, column),
            descriptions.as_deref(),
            grammar.as_deref(),
            &settings,
            format,
        ),
        Cmd::Files { file, grammar } => cmd_files(&file, grammar.as_deref(), &settings, format),
        Cmd::Report { file, pst, root } => {
            cmd_report(&file, &pst, root.as_deref(), &settings, format)
        }
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_sections(file: &str, format: Format) -> Result<()> {
    let doc = Document::new(&read_input(file)?);
    let sections = doc.sections();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&sections)?),
        Format::Pretty => {
            for section in &sections {
                let kind = match section.kind {
                    SectionKind::Named => "named",
                    SectionKind::Extension => "extension",
                    SectionKind::Implicit => "implicit",
                };
                let name = if section.name.is_empty() {
                    "(whole document)"
                } else {
                    section.name.as_str()
                };
                println!(
                    "{:>5}-{:<5} {kind:<9} {name}",
                    section.start_line + 1,
                    section.end_line + 1
                );
            }
        }
    }
    Ok(())
}

fn cmd_parse(file: &str, grammar: Option<&Path>, settings: &Settings) -> Result<()> {
    let doc = Document::new(&read_input(file)?);
    let owned = load_grammar(grammar, settings)?;
    let table = owned.as_ref().unwrap_or_else(|| GrammarTable::builtin());

    // The analysis is the output in both modes.
    let analysis = analyze(&doc, table);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn cmd_lint(file: &str, grammar: Option<&Path>, settings: &Settings, format: Format) -> Result<()> {
    let doc = Document::new(&read_input(file)?);
    let owned = load_grammar(grammar, settings)?;
    let table = owned.as_ref().unwrap_or_else(|| GrammarTable::builtin());
    let options = LintOptions {
        severity: settings.severity.clone(),
    };

    let result = lint_document(&doc, table, &options);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": result.ok,
                "issues": result.issues,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics(doc.text(), file, &result.issues);
            print_summary(result.issues.iter().map(|d| d.severity));
            if result.ok {
                eprintln!("lint ok");
            }
        }
    }

    exit_on_errors(&result.issues);
    Ok(())
}

#[derive(Serialize)]
struct DescribeOutput<'a> {
    target: Option<&'a Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a Description>,
}

fn cmd_describe(
    file: &str,
    (line, column): (usize, usize),
    descriptions: Option<&Path>,
    grammar: Option<&Path>,
    settings: &Settings,
    format: Format,
) -> Result<()> {
    if line == 0 || column == 0 {
        bail!("--line and --column are 1-based");
    }
    let doc = Document::new(&read_input(file)?);
    let owned = load_grammar(grammar, settings)?;
    let table = owned.as_ref().unwrap_or_else(|| GrammarTable::builtin());

    let line = line - 1;
    let col = doc.line(line).map_or(0, |text| byte_column(text, column - 1));
    let target = lookup(&doc, table, line, col);
    let resolved = match &target {
        Some(Target::File { path, .. }) => Some(resolve(&base_dir(file), path)),
        _ => None,
    };

    let table_path = descriptions.or(settings.descriptions.as_deref());
    let descriptions = match table_path {
        Some(path) => Some(
            DescriptionTable::load(path)
                .with_context(|| format!("failed to load descriptions from {}", path.display()))?,
        ),
        None => None,
    };
    let description = target
        .as_ref()
        .zip(descriptions.as_ref())
        .and_then(|(target, table)| table.get(target.lookup_name()));

    match format {
        Format::Json => {
            let out = DescribeOutput {
                target: target.as_ref(),
                resolved: resolved.as_deref(),
                description,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => match &target {
            Some(target) => render::print_target(target, resolved.as_deref(), description),
            None => eprintln!("nothing to describe at {}:{column}", line + 1),
        },
    }
    Ok(())
}

#[derive(Serialize)]
struct FileListing<'a> {
    #[serde(flatten)]
    reference: &'a FileReference,
    exists: bool,
}

fn cmd_files(file: &str, grammar: Option<&Path>, settings: &Settings, format: Format) -> Result<()> {
    let doc = Document::new(&read_input(file)?);
    let owned = load_grammar(grammar, settings)?;
    let table = owned.as_ref().unwrap_or_else(|| GrammarTable::builtin());

    let refs = file_references(&doc, table, &base_dir(file));
    let listing: Vec<FileListing<'_>> = refs
        .iter()
        .map(|reference| FileListing {
            reference,
            exists: reference.resolved.exists(),
        })
        .collect();
    log::debug!("{} file reference(s) in {file}", listing.len());

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        Format::Pretty => {
            for entry in &listing {
                print_files(entry.reference, entry.exists);
            }
        }
    }
    Ok(())
}

fn cmd_report(
    file: &str,
    pst: &Path,
    root: Option<&Path>,
    settings: &Settings,
    format: Format,
) -> Result<()> {
    let output = read_input(file)?;
    let root = match root.or(settings.workspace_root.as_deref()) {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("cannot determine the working directory")?,
    };
    let ctx = ReportContext::new(&root, pst)?;

    let mut report = parse_report(&output, &ctx);
    let suppressible = if settings.checker.skip_warnings {
        report = report.without_warnings();
        Vec::new()
    } else {
        suppressible_checks(&output)
    };

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": !report.has_errors(),
                "counts": report.counts(),
                "files": report.by_file(),
                "suppressible": suppressible,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            print_findings(&report);
            print_summary(report.findings.iter().map(|f| f.severity));
            if !suppressible.is_empty() {
                eprintln!(
                    "hint: {} check(s) here can be silenced with \"checker\": {{ \"skip_warnings\": true }}",
                    suppressible.len()
                );
            }
        }
    }

    if report.has_errors() {
        process::exit(1);
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Exit with code 1 if any diagnostic is an error.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        process::exit(1);
    }
}

/// Read `path`, or stdin when it is `-`.
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

/// Directory relative paths in a control file resolve against: the file's
/// own directory, or the working directory for stdin.
fn base_dir(file: &str) -> PathBuf {
    if file == "-" {
        return PathBuf::from(".");
    }
    match Path::new(file).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Settings from `--config`, else `pst.json` in the working directory, else defaults.
fn resolve_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return Ok(load_settings(path)?);
    }
    let fallback = Path::new(DEFAULT_SETTINGS_FILE);
    if fallback.is_file() {
        log::debug!("using {DEFAULT_SETTINGS_FILE} from the working directory");
        return Ok(load_settings(fallback)?);
    }
    Ok(Settings::default())
}

/// Load the grammar named by `--grammar` or the settings. `None` means the
/// built-in table applies.
fn load_grammar(explicit: Option<&Path>, settings: &Settings) -> Result<Option<GrammarTable>> {
    let Some(path) = explicit.or(settings.grammar.as_deref()) else {
        return Ok(None);
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read grammar table {}", path.display()))?;
    let table = GrammarTable::from_json(&json)
        .with_context(|| format!("failed to load grammar table {}", path.display()))?;
    log::debug!("loaded grammar table from {}", path.display());
    Ok(Some(table))
}

/// Byte offset of the `column`th character of `text`, clamped to its end.
fn byte_column(text: &str, column: usize) -> usize {
    text.char_indices()
        .nth(column)
        .map_or(text.len(), |(offset, _)| offset)
}
