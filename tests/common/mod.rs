// Copyright (C) Brian G. Milnes 2025

//! Common test utilities for integration tests

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use rekey::{MappingConfig, MappingTable, RenameRule, Role, RoleSet};

/// A throwaway project tree on disk
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(TestProject {
            dir: tempfile::tempdir().context("Failed to create temp dir")?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {relative}"))?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        fs::read_to_string(self.dir.path().join(relative))
            .with_context(|| format!("Failed to read {relative}"))
    }
}

pub fn key_rule(from: &str, to: &str) -> RenameRule {
    RenameRule::new(from, to, RoleSet::of(&[Role::ObjectKey]))
}

pub fn field_rule(from: &str, to: &str) -> RenameRule {
    RenameRule::new(from, to, RoleSet::FIELD)
}

/// A table with the given field rules and defaults for everything else
pub fn table(fields: Vec<RenameRule>) -> MappingTable {
    MappingTable::new(MappingConfig {
        fields,
        ..MappingConfig::default()
    })
    .expect("test mapping should be valid")
}

/// Parse a number that may contain commas (e.g., "1,234")
pub fn parse_number(s: &str) -> Result<usize> {
    Ok(s.replace(',', "").parse()?)
}
