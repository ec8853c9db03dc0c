// Copyright (C) Brian G. Milnes 2025

//! Tool runner infrastructure for the rekey binary
//!
//! Wraps a command with:
//! - Directory context for Emacs compile-mode
//! - Optional logging to files
//! - Summary and timing lines

pub mod tool_runner {
    use std::time::Instant;
    use std::path::PathBuf;
    use anyhow::Result;
    use crate::logging::logging::ToolLogger;

    pub struct ToolConfig {
        /// Name of the tool (for the logging directory)
        pub tool_name: String,
        /// Directory shown in "Entering directory"; logs are written under it
        pub base_dir: PathBuf,
        pub enable_logging: bool,
        /// Suppress human-readable stdout (machine output is printed by the caller)
        pub quiet: bool,
    }

    impl ToolConfig {
        pub fn new(tool_name: &str, base_dir: PathBuf) -> Self {
            ToolConfig {
                tool_name: tool_name.to_string(),
                base_dir,
                enable_logging: false,
                quiet: false,
            }
        }
    }

    /// Run a tool with timing, context and optional logging.
    ///
    /// The closure returns its summary line plus a value handed back to the caller.
    ///
    /// ```no_run
    /// # use rekey::tool_runner::tool_runner::{run_tool, ToolConfig};
    /// # fn main() -> anyhow::Result<()> {
    /// let config = ToolConfig::new("rekey-fix", std::path::PathBuf::from("."));
    /// let files = run_tool(config, |logger| {
    ///     logger.log("Starting...");
    ///     Ok(("Total files fixed: 0".to_string(), 0usize))
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn run_tool<T, F>(config: ToolConfig, tool_fn: F) -> Result<T>
    where
        F: FnOnce(&mut ToolLogger) -> Result<(String, T)>,
    {
        let start = Instant::now();

        if !config.quiet {
            println!("Entering directory '{}'", config.base_dir.display());
            println!();
        }

        let mut logger = if config.enable_logging {
            ToolLogger::new(&config.base_dir, &config.tool_name)
        } else {
            ToolLogger::new_disabled()
        }
        .quiet(config.quiet);

        let (summary, value) = tool_fn(&mut logger)?;

        if !config.quiet {
            println!();
            println!("{summary}");
            println!("Completed in {}ms", start.elapsed().as_millis());
        }

        if config.enable_logging {
            logger.finalize(&summary);
        }

        Ok(value)
    }
}
