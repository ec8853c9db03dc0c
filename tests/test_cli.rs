// Copyright (C) Brian G. Milnes 2025

//! Integration tests for the rekey binary

use anyhow::Result;
use serial_test::serial;
use std::path::Path;
use std::process::{Command, Output};

mod common;
use common::{parse_number, TestProject};

const MAPPING: &str = r#"{
  "fields": [
    { "from": "instanceId", "to": "instance_id" },
    { "from": "riskLevel", "to": "risk_level" }
  ]
}"#;

const CAMPAIGN: &str = "await prisma.campaigns.create({ data: { instanceId: x, riskLevel: 'low' } });\n";

fn rekey(dir: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_rekey"))
        .args(args)
        .current_dir(dir)
        .output()?)
}

#[test]
#[serial]
fn test_fix_rewrites_project() -> Result<()> {
    let project = TestProject::new()?;
    project.write("mapping.json", MAPPING)?;
    project.write("lib/campaign.ts", CAMPAIGN)?;
    project.write("lib/util.ts", "export const one = 1;\n")?;

    let output = rekey(project.root(), &["fix", ".", "--mapping", "mapping.json"])?;
    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;
    if !stderr.is_empty() {
        eprintln!("STDERR: {}", stderr);
    }

    assert_eq!(output.status.code(), Some(0), "Output: {}", stdout);
    assert!(stdout.contains("Total files fixed: 1"), "Missing summary in:\n{}", stdout);
    assert!(stdout.contains("lib/campaign.ts: pass 1: 2 edit(s)"), "Missing per-file line in:\n{}", stdout);

    // Expected format: "Summary: 2 files scanned, 2 edits, 0 imports injected, ..."
    let summary_line = stdout
        .lines()
        .find(|line| line.starts_with("Summary:"))
        .expect("Summary line not found");
    let files_scanned = summary_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| parse_number(s).ok())
        .expect("Failed to parse files scanned");
    assert_eq!(files_scanned, 2);

    assert_eq!(
        project.read("lib/campaign.ts")?,
        "await prisma.campaigns.create({ data: { instance_id: x, risk_level: 'low' } });\n"
    );
    Ok(())
}

#[test]
#[serial]
fn test_fix_dry_run_json() -> Result<()> {
    let project = TestProject::new()?;
    project.write("mapping.json", MAPPING)?;
    project.write("lib/campaign.ts", CAMPAIGN)?;

    let output = rekey(project.root(), &["fix", "--mapping", "mapping.json", "--dry-run", "--json"])?;
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["outcome"], "Converged");
    assert_eq!(report["changed_files"][0], "lib/campaign.ts");
    assert_eq!(project.read("lib/campaign.ts")?, CAMPAIGN);
    Ok(())
}

#[test]
#[serial]
fn test_fix_with_invalid_mapping_exits_2() -> Result<()> {
    let project = TestProject::new()?;
    project.write(
        "mapping.json",
        r#"{ "fields": [{ "from": "riskLevel", "to": "risk_level" }, { "from": "riskLevel", "to": "risk" }] }"#,
    )?;
    project.write("lib/campaign.ts", CAMPAIGN)?;

    let output = rekey(project.root(), &["fix", "--mapping", "mapping.json"])?;
    let stderr = String::from_utf8(output.stderr)?;

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("ambiguous rules"), "Unexpected error output:\n{}", stderr);
    assert_eq!(project.read("lib/campaign.ts")?, CAMPAIGN);
    Ok(())
}

#[test]
#[serial]
fn test_fix_exhausted_without_conflicts_exits_3() -> Result<()> {
    let project = TestProject::new()?;
    project.write(
        "mapping.json",
        r#"{ "fields": [
            { "from": "foo", "to": "bar", "scope": ["MemberAccess"] },
            { "from": "bar", "to": "foo", "scope": ["MemberAccess"] }
        ] }"#,
    )?;
    project.write("lib/flip.ts", "x.foo;\n")?;

    let output = rekey(project.root(), &["fix", "--mapping", "mapping.json", "--max-passes", "2"])?;
    let stderr = String::from_utf8(output.stderr)?;

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr.contains("no fixpoint after 2 passes"), "Missing warning in:\n{}", stderr);
    Ok(())
}

#[test]
#[serial]
fn test_fix_writes_log_file() -> Result<()> {
    let project = TestProject::new()?;
    project.write("mapping.json", MAPPING)?;
    project.write("lib/campaign.ts", CAMPAIGN)?;

    let output = rekey(project.root(), &["fix", "--mapping", "mapping.json", "--log"])?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("Log saved to:"), "Missing log path in:\n{}", stdout);
    assert!(project.root().join("logs/rekey-fix").is_dir());
    Ok(())
}

#[test]
#[serial]
fn test_validate_mapping() -> Result<()> {
    let project = TestProject::new()?;
    project.write("good.json", MAPPING)?;
    project.write("bad.json", r#"{ "fields": [{ "from": "a", "to": "b", "scope": ["Keys"] }] }"#)?;

    let good = rekey(project.root(), &["validate-mapping", "good.json"])?;
    assert_eq!(good.status.code(), Some(0));
    assert!(String::from_utf8(good.stdout)?.contains("✓ Mapping is valid: 2 rule(s)"));

    let bad = rekey(project.root(), &["validate-mapping", "bad.json"])?;
    assert_eq!(bad.status.code(), Some(1));
    assert!(String::from_utf8(bad.stdout)?.contains("✗ Schema errors:"));
    Ok(())
}

#[test]
#[serial]
fn test_show_mapping_is_loadable() -> Result<()> {
    let project = TestProject::new()?;
    let output = rekey(project.root(), &["show-mapping"])?;
    assert_eq!(output.status.code(), Some(0));

    let path = project.write("builtin.json", &String::from_utf8(output.stdout)?)?;
    let table = rekey::MappingTable::from_file(&path)?;
    assert!(table.is_candidate("riskLevel"));
    Ok(())
}
