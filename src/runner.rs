// Copyright (C) Brian G. Milnes 2025

//! Pass runner: sweep every file until nothing changes
//!
//! States: Idle → Scanning → Rewriting → Converged | Exhausted (| Cancelled).
//! Each sweep processes files in parallel; the end of a sweep is a barrier.
//! A changed file is written whole (temp file + rename) or not at all.

pub mod runner {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use anyhow::{bail, Context, Result};
    use rayon::prelude::*;

    use crate::discovery::discovery::{find_source_files, DEFAULT_EXTENSIONS, DEFAULT_SKIP_DIRS};
    use crate::injector::injector::inject;
    use crate::logging::logging::ToolLogger;
    use crate::mapping::mapping::MappingTable;
    use crate::report::report::{ConflictRecord, FileFailure, Outcome, RunReport};
    use crate::rewrite::rewrite::rewrite;

    pub const DEFAULT_MAX_PASSES: usize = 5;

    #[derive(Debug, Clone)]
    pub struct RunConfig {
        pub root: PathBuf,
        /// Sub-directories of `root` to process; empty means all of `root`
        pub dirs: Vec<PathBuf>,
        pub extensions: Vec<String>,
        pub skip_dirs: Vec<String>,
        pub max_passes: usize,
        pub dry_run: bool,
    }

    impl RunConfig {
        pub fn new(root: &Path) -> Self {
            RunConfig {
                root: root.to_path_buf(),
                dirs: Vec::new(),
                extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
                skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
                max_passes: DEFAULT_MAX_PASSES,
                dry_run: false,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RunState {
        Idle,
        Scanning,
        Rewriting,
        Converged,
        Exhausted,
        Cancelled,
    }

    struct Tracked {
        relative: PathBuf,
        text: String,
    }

    enum FileOutcome {
        Unchanged,
        Changed { text: String, edits: usize, injected: bool },
        Failed(String),
    }

    struct FileResult {
        outcome: FileOutcome,
        conflicts: Vec<ConflictRecord>,
    }

    pub struct PassRunner<'a> {
        table: &'a MappingTable,
        config: RunConfig,
        cancel: Option<Arc<AtomicBool>>,
        state: RunState,
    }

    impl<'a> PassRunner<'a> {
        pub fn new(table: &'a MappingTable, config: RunConfig) -> Self {
            PassRunner {
                table,
                config,
                cancel: None,
                state: RunState::Idle,
            }
        }

        /// Stop before the next sweep once `flag` is set
        pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
            self.cancel = Some(flag);
            self
        }

        pub fn state(&self) -> RunState {
            self.state
        }

        pub fn config(&self) -> &RunConfig {
            &self.config
        }

        /// Discover eligible files under the configured root and run on them
        pub fn run(&mut self, logger: &mut ToolLogger) -> Result<RunReport> {
            let files = find_source_files(
                &self.config.root,
                &self.config.dirs,
                &self.config.extensions,
                &self.config.skip_dirs,
            );
            self.run_files(&files, logger)
        }

        /// Run on an explicit file list, paths relative to the root
        pub fn run_files(&mut self, files: &[PathBuf], logger: &mut ToolLogger) -> Result<RunReport> {
            if self.config.max_passes == 0 {
                bail!("max passes must be at least 1");
            }

            let mut report = RunReport::new(self.config.dry_run);
            let mut tracked = Vec::with_capacity(files.len());
            for relative in files {
                let path = self.config.root.join(relative);
                match fs::read_to_string(&path) {
                    Ok(text) => tracked.push(Tracked {
                        relative: relative.clone(),
                        text,
                    }),
                    Err(e) => {
                        logger.warn(&format!("Failed to read {}: {e}", relative.display()));
                        report.failures.push(FileFailure {
                            file: relative.clone(),
                            message: format!("read failed: {e}"),
                        });
                    }
                }
            }
            report.files_scanned = tracked.len();

            if self.config.dry_run {
                logger.log("DRY RUN MODE: Will not modify files");
                logger.log("");
            }

            let mut pass = 0;
            self.state = loop {
                if self.cancel.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
                    logger.warn(&format!("Cancelled after {pass} sweep(s)"));
                    break RunState::Cancelled;
                }
                pass += 1;

                self.state = RunState::Scanning;
                let results: Vec<FileResult> = tracked.par_iter().map(|file| self.process(file)).collect();

                self.state = RunState::Rewriting;
                let mut changed = 0;
                let mut sweep_conflicts = Vec::new();
                let mut failed = Vec::new();
                for (index, (file, result)) in tracked.iter_mut().zip(results).enumerate() {
                    sweep_conflicts.extend(result.conflicts);
                    match result.outcome {
                        FileOutcome::Unchanged => {}
                        FileOutcome::Changed { text, edits, injected } => {
                            changed += 1;
                            report.edits_applied += edits;
                            if injected {
                                report.imports_injected += 1;
                            }
                            logger.log(&format!(
                                "{}: pass {pass}: {edits} edit(s){}",
                                file.relative.display(),
                                if injected { ", helper import added" } else { "" }
                            ));
                            report.changed_files.insert(file.relative.clone());
                            file.text = text;
                        }
                        FileOutcome::Failed(message) => {
                            logger.warn(&format!("{}: {message}", file.relative.display()));
                            report.failures.push(FileFailure {
                                file: file.relative.clone(),
                                message,
                            });
                            failed.push(index);
                        }
                    }
                }
                for index in failed.into_iter().rev() {
                    tracked.remove(index);
                }
                report.conflicts = sweep_conflicts;

                if changed == 0 {
                    break RunState::Converged;
                }
                report.passes_used += 1;
                if pass >= self.config.max_passes {
                    break RunState::Exhausted;
                }
            };

            report.outcome = match self.state {
                RunState::Exhausted => Outcome::Exhausted,
                RunState::Cancelled => Outcome::Cancelled,
                _ => Outcome::Converged,
            };

            for conflict in &report.conflicts {
                logger.log(&conflict.to_string());
            }
            if report.outcome == Outcome::Exhausted {
                logger.warn(&format!(
                    "no fixpoint after {} passes; {} conflict(s) outstanding, applied rewrites kept",
                    self.config.max_passes,
                    report.conflicts.len()
                ));
            }

            Ok(report)
        }

        fn process(&self, file: &Tracked) -> FileResult {
            match self.rewrite_file(file) {
                Ok(result) => result,
                Err(e) => FileResult {
                    outcome: FileOutcome::Failed(format!("{e:#}")),
                    conflicts: Vec::new(),
                },
            }
        }

        fn rewrite_file(&self, file: &Tracked) -> Result<FileResult> {
            let rewritten = rewrite(&file.relative, &file.text, self.table)?;
            let injection = inject(&rewritten.new_text, rewritten.imports_needed, self.table.helper());

            if injection.text == file.text {
                return Ok(FileResult {
                    outcome: FileOutcome::Unchanged,
                    conflicts: rewritten.conflicts,
                });
            }

            if !self.config.dry_run {
                write_atomic(&self.config.root.join(&file.relative), &injection.text)?;
            }

            Ok(FileResult {
                outcome: FileOutcome::Changed {
                    text: injection.text,
                    edits: rewritten.change_set.edits.len(),
                    injected: injection.injected,
                },
                conflicts: rewritten.conflicts,
            })
        }
    }

    /// Write `text` to a sibling temp file, then rename it over `path`
    pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
        let name = path
            .file_name()
            .with_context(|| format!("not a file path: {}", path.display()))?;
        let mut temp_name = std::ffi::OsString::from(".");
        temp_name.push(name);
        temp_name.push(".rekey.tmp");
        let temp = path.with_file_name(temp_name);

        fs::write(&temp, text).with_context(|| format!("write failed: {}", temp.display()))?;
        if let Err(e) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            return Err(e).with_context(|| format!("write failed: {}", path.display()));
        }
        Ok(())
    }
}
