// Copyright (C) Brian G. Milnes 2025

//! Rekey: rewrite application code after a camelCase → snake_case schema rename
//!
//! Usage:
//!   rekey fix [ROOT] [--mapping FILE] [--max-passes N] [--dry-run] [-d DIR]... [-e EXT]... [--json] [--log]
//!   rekey validate-mapping FILE
//!   rekey show-mapping
//!
//! Exit codes for `fix`: 0 converged, 1 cancelled or pass budget exhausted
//! with conflicts outstanding, 2 configuration error (nothing was written),
//! 3 pass budget exhausted with no conflicts (warning).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use rekey::mapping::mapping::schema_errors;
use rekey::runner::runner::DEFAULT_MAX_PASSES;
use rekey::tool_runner::tool_runner::{run_tool, ToolConfig};
use rekey::{builtin_mapping, MappingTable, PassRunner, RunConfig, RunReport};

#[derive(Parser)]
#[command(name = "rekey")]
#[command(about = "Follow a camelCase to snake_case schema rename through TypeScript/JavaScript code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite schema-bound identifiers until a sweep changes nothing
    ///
    /// Exit codes: 0 converged, 1 cancelled or exhausted with conflicts
    /// outstanding, 2 configuration error, 3 exhausted with no conflicts.
    Fix(FixArgs),
    /// Check a mapping file against the schema and the rule invariants
    ValidateMapping {
        /// Mapping JSON file
        path: PathBuf,
    },
    /// Print the built-in mapping as JSON
    ShowMapping,
}

#[derive(Args)]
struct FixArgs {
    /// Project root
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Mapping JSON file (defaults to the built-in mapping)
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Maximum number of sweeps before giving up
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_PASSES)]
    max_passes: usize,

    /// Dry run - report what would change without modifying files
    #[arg(long)]
    dry_run: bool,

    /// Sub-directory of ROOT to process (repeatable)
    #[arg(short, long = "dir")]
    dirs: Vec<PathBuf>,

    /// File extension to process (repeatable; default ts, tsx, js, jsx)
    #[arg(short, long = "ext")]
    extensions: Vec<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Also write a log file under ROOT/logs/rekey-fix/
    #[arg(long)]
    log: bool,
}

fn load_table(mapping: Option<&Path>) -> Result<MappingTable> {
    match mapping {
        Some(path) => MappingTable::from_file(path),
        None => MappingTable::new(builtin_mapping()).context("Built-in mapping is invalid"),
    }
}

fn fix(args: FixArgs) -> Result<i32> {
    let table = load_table(args.mapping.as_deref())?;

    let root = args.root.canonicalize()
        .with_context(|| format!("Cannot open project root: {}", args.root.display()))?;
    let mut config = RunConfig::new(&root);
    config.dirs = args.dirs;
    config.max_passes = args.max_passes;
    config.dry_run = args.dry_run;
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.iter().map(|e| e.trim_start_matches('.').to_string()).collect();
    }

    let mut tool = ToolConfig::new("rekey-fix", root);
    tool.enable_logging = args.log;
    tool.quiet = args.json;

    let report: RunReport = run_tool(tool, |logger| {
        let mut runner = PassRunner::new(&table, config);
        let report = runner.run(logger)?;
        let summary = format!("{}\n{}", report.details_line(), report.summary_line());
        Ok((summary, report))
    })?;

    if args.json {
        println!("{}", report.to_json()?);
    }
    Ok(report.exit_code())
}

fn validate_mapping(path: &Path) -> Result<i32> {
    println!("rekey validate-mapping");
    println!("======================");
    println!("Mapping: {}", path.display());
    println!();

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping: {}", path.display()))?;
    let data: Value = serde_json::from_str(&content).context("Failed to parse mapping JSON")?;

    let problems = schema_errors(&data)?;
    if !problems.is_empty() {
        println!("✗ Schema errors:");
        for problem in &problems {
            println!("  - {problem}");
        }
        return Ok(1);
    }

    match MappingTable::from_json(&content) {
        Ok(table) => {
            println!("✓ Mapping is valid: {} rule(s)", table.rules().len());
            Ok(0)
        }
        Err(e) => {
            println!("✗ {e:#}");
            Ok(1)
        }
    }
}

fn show_mapping() -> Result<i32> {
    println!("{}", serde_json::to_string_pretty(&builtin_mapping())?);
    Ok(0)
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fix(args) => fix(args),
        Commands::ValidateMapping { path } => validate_mapping(&path),
        Commands::ShowMapping => show_mapping(),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit(2);
        }
    }
}
