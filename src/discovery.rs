// Copyright (C) Brian G. Milnes 2025

//! Source file discovery for rekey runs
//!
//! Thin wrapper over walkdir: pick the directories to search, skip build and
//! dependency folders, keep files with an eligible extension.

pub mod discovery {
    use std::path::{Path, PathBuf};

    use walkdir::{DirEntry, WalkDir};

    pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];
    pub const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", ".next", ".git", "dist", "build", "target"];

    /// Format a number with thousands separators: 1234 → "1,234"
    pub fn format_number(n: usize) -> String {
        let digits = n.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }

    /// Directories to search under `root`: the given ones that exist, or `root` itself
    pub fn get_search_dirs(root: &Path, dirs: &[PathBuf]) -> Vec<PathBuf> {
        if dirs.is_empty() {
            return vec![root.to_path_buf()];
        }
        dirs.iter()
            .map(|d| root.join(d))
            .filter(|d| d.exists())
            .collect()
    }

    fn is_skipped(entry: &DirEntry, skip_dirs: &[String]) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| skip_dirs.iter().any(|s| s == name))
    }

    /// Eligible files under the search dirs, relative to `root`, sorted and deduplicated
    pub fn find_source_files(root: &Path, dirs: &[PathBuf], extensions: &[String], skip_dirs: &[String]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in get_search_dirs(root, dirs) {
            for entry in WalkDir::new(&dir)
                .into_iter()
                .filter_entry(|e| !is_skipped(e, skip_dirs))
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let eligible = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| extensions.iter().any(|x| x == ext));
                if !eligible {
                    continue;
                }
                let relative = path.strip_prefix(root).unwrap_or(path);
                files.push(relative.to_path_buf());
            }
        }
        files.sort();
        files.dedup();
        files
    }
}
