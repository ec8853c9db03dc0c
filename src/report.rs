// Copyright (C) Brian G. Milnes 2025

//! Run report: what changed, what could not be decided, what failed

pub mod report {
    use std::collections::BTreeSet;
    use std::fmt;
    use std::path::PathBuf;

    use anyhow::Result;
    use serde::{Deserialize, Serialize};

    use crate::discovery::discovery::format_number;
    use crate::mapping::mapping::Role;

    /// An occurrence the resolver could not decide
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConflictRecord {
        pub file: PathBuf,
        pub offset: usize,
        /// 1-based line of `offset`
        pub line: usize,
        pub identifier: String,
        pub role: Role,
        pub candidates: Vec<String>,
    }

    impl fmt::Display for ConflictRecord {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{}:{}: conflict on {} ({}): candidates {}",
                self.file.display(),
                self.line,
                self.identifier,
                self.role,
                self.candidates.join(" | ")
            )
        }
    }

    /// A file that could not be read or written
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FileFailure {
        pub file: PathBuf,
        pub message: String,
    }

    impl fmt::Display for FileFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}: {}", self.file.display(), self.message)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Outcome {
        /// A full sweep changed nothing
        Converged,
        /// The pass ceiling was reached while files were still changing
        Exhausted,
        /// Stopped between sweeps on request
        Cancelled,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RunReport {
        pub changed_files: BTreeSet<PathBuf>,
        /// Conflicts still outstanding after the last completed sweep
        pub conflicts: Vec<ConflictRecord>,
        pub failures: Vec<FileFailure>,
        /// Sweeps that changed at least one file
        pub passes_used: usize,
        pub outcome: Outcome,
        pub files_scanned: usize,
        pub edits_applied: usize,
        pub imports_injected: usize,
        pub dry_run: bool,
    }

    impl RunReport {
        pub fn new(dry_run: bool) -> Self {
            RunReport {
                changed_files: BTreeSet::new(),
                conflicts: Vec::new(),
                failures: Vec::new(),
                passes_used: 0,
                outcome: Outcome::Converged,
                files_scanned: 0,
                edits_applied: 0,
                imports_injected: 0,
                dry_run,
            }
        }

        pub fn summary_line(&self) -> String {
            let verb = if self.dry_run { "Total files to fix" } else { "Total files fixed" };
            format!("{verb}: {}", format_number(self.changed_files.len()))
        }

        pub fn details_line(&self) -> String {
            format!(
                "Summary: {} files scanned, {} edits, {} imports injected, {} conflicts, {} failures, {} passes ({:?})",
                format_number(self.files_scanned),
                format_number(self.edits_applied),
                self.imports_injected,
                self.conflicts.len(),
                self.failures.len(),
                self.passes_used,
                self.outcome
            )
        }

        /// 0 converged, 1 cancelled or exhausted with conflicts left, 3 exhausted
        /// with no conflicts (rules still undo each other)
        pub fn exit_code(&self) -> i32 {
            match self.outcome {
                Outcome::Converged => 0,
                Outcome::Exhausted if self.conflicts.is_empty() => 3,
                Outcome::Exhausted | Outcome::Cancelled => 1,
            }
        }

        pub fn to_json(&self) -> Result<String> {
            Ok(serde_json::to_string_pretty(self)?)
        }
    }
}
