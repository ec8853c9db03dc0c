// Copyright (C) Brian G. Milnes 2025

//! Logging for rekey runs
//!
//! Messages go to stdout and, when enabled, to a log file organized by tool
//! and date:
//! - <base>/logs/<tool-name>/<date>/run-<timestamp>.log
//!
//! Warnings go to stderr instead of stdout so `--json` output stays clean.

pub mod logging {
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use chrono::{Local, DateTime};
    use anyhow::Result;

    pub struct ToolLogger {
        log_file: Option<fs::File>,
        log_path: Option<PathBuf>,
        start_time: DateTime<Local>,
        quiet: bool,
    }

    impl ToolLogger {
        /// A logger that only prints
        pub fn new_disabled() -> Self {
            ToolLogger {
                log_file: None,
                log_path: None,
                start_time: Local::now(),
                quiet: false,
            }
        }

        /// Create a logger writing under `base/logs/<tool-name>/<YYYY-MM-DD>/run-<HH-MM-SS>.log`.
        ///
        /// If the log file cannot be created the logger keeps printing without it.
        pub fn new(base: &Path, tool_name: &str) -> Self {
            let start_time = Local::now();

            let (log_file, log_path) = match Self::create_log_file(base, tool_name, &start_time) {
                Ok((file, path)) => (Some(file), Some(path)),
                Err(e) => {
                    eprintln!("Warning: Could not create log file: {e}");
                    eprintln!("Continuing without logging...");
                    (None, None)
                }
            };

            ToolLogger {
                log_file,
                log_path,
                start_time,
                quiet: false,
            }
        }

        /// Stop echoing `log` lines to stdout; the log file still gets them
        pub fn quiet(mut self, quiet: bool) -> Self {
            self.quiet = quiet;
            self
        }

        fn create_log_file(base: &Path, tool_name: &str, start_time: &DateTime<Local>) -> Result<(fs::File, PathBuf)> {
            let date_str = start_time.format("%Y-%m-%d").to_string();
            let time_str = start_time.format("%H-%M-%S").to_string();

            let log_dir = base.join("logs").join(tool_name).join(&date_str);
            fs::create_dir_all(&log_dir)?;

            let log_path = log_dir.join(format!("run-{time_str}.log"));
            let log_file = fs::File::create(&log_path)?;

            Ok((log_file, log_path))
        }

        pub fn log(&mut self, message: &str) {
            if !self.quiet {
                println!("{message}");
            }
            self.log_silent(message);
        }

        pub fn warn(&mut self, message: &str) {
            let line = format!("Warning: {message}");
            eprintln!("{line}");
            self.log_silent(&line);
        }

        /// Log file only
        pub fn log_silent(&mut self, message: &str) {
            if let Some(ref mut file) = self.log_file {
                let _ = writeln!(file, "{message}");
            }
        }

        pub fn log_path(&self) -> Option<&Path> {
            self.log_path.as_deref()
        }

        pub fn finalize(&mut self, summary: &str) {
            let end_time = Local::now();
            let duration = end_time.signed_duration_since(self.start_time);

            self.log_silent("");
            self.log_silent("=== Run Summary ===");
            self.log_silent(summary);
            self.log_silent(&format!("Started: {}", self.start_time.format("%Y-%m-%d %H:%M:%S")));
            self.log_silent(&format!("Ended: {}", end_time.format("%Y-%m-%d %H:%M:%S")));
            self.log_silent(&format!("Duration: {}ms", duration.num_milliseconds()));

            if let Some(path) = self.log_path.clone() {
                self.log(&format!("Log saved to: {}", path.display()));
            }
        }
    }

    impl Drop for ToolLogger {
        fn drop(&mut self) {
            if let Some(ref mut file) = self.log_file {
                let _ = file.flush();
            }
        }
    }
}
