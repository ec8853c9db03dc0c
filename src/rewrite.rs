// Copyright (C) Brian G. Milnes 2025

//! Rewrite engine: classify, resolve, and splice one file
//!
//! Every edit of a file is collected first and applied in a single
//! right-to-left pass, so offsets stay valid and bytes outside edited spans are
//! never touched. Conflicts are recorded and left alone.

pub mod rewrite {
    use std::path::{Path, PathBuf};

    use anyhow::{bail, Result};
    use regex::Regex;
    use serde::{Deserialize, Serialize};

    use crate::classifier::classifier::{Occurrence, Scan};
    use crate::injector::injector::declares;
    use crate::lexer::lexer::TokenKind;
    use crate::mapping::mapping::{MappingTable, Role};
    use crate::report::report::ConflictRecord;
    use crate::resolver::resolver::{resolve, ResolveContext, Verdict};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Edit {
        pub offset: usize,
        pub length: usize,
        pub replacement: String,
    }

    /// All edits of one file, committed together
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChangeSet {
        pub file: PathBuf,
        pub edits: Vec<Edit>,
    }

    impl ChangeSet {
        pub fn new(file: &Path) -> Self {
            ChangeSet {
                file: file.to_path_buf(),
                edits: Vec::new(),
            }
        }

        pub fn is_empty(&self) -> bool {
            self.edits.is_empty()
        }

        pub fn push(&mut self, offset: usize, length: usize, replacement: String) {
            self.edits.push(Edit {
                offset,
                length,
                replacement,
            });
        }

        /// Apply every edit to `text`, highest offset first.
        ///
        /// Fails without touching anything if two edits overlap or an edit runs
        /// past the end of the text.
        pub fn apply(&self, text: &str) -> Result<String> {
            let mut edits: Vec<&Edit> = self.edits.iter().collect();
            // An insertion sorts before a replacement at the same offset so it lands in front of it.
            edits.sort_by_key(|e| (e.offset, e.length));

            for pair in edits.windows(2) {
                if pair[0].offset + pair[0].length > pair[1].offset {
                    bail!(
                        "{}: overlapping edits at {} and {}",
                        self.file.display(),
                        pair[0].offset,
                        pair[1].offset
                    );
                }
            }
            if let Some(last) = edits.last() {
                if last.offset + last.length > text.len() {
                    bail!("{}: edit at {} runs past end of file", self.file.display(), last.offset);
                }
            }

            let mut result = text.to_string();
            for edit in edits.iter().rev() {
                result.replace_range(edit.offset..edit.offset + edit.length, &edit.replacement);
            }
            Ok(result)
        }
    }

    /// Result of rewriting one file once
    #[derive(Debug, Clone)]
    pub struct FileRewrite {
        pub new_text: String,
        pub change_set: ChangeSet,
        pub conflicts: Vec<ConflictRecord>,
        /// A create site lacks an identifier and the helper is not declared yet
        pub imports_needed: bool,
    }

    impl FileRewrite {
        pub fn changed(&self) -> bool {
            !self.change_set.is_empty()
        }
    }

    /// Turn `path` into the `/`-separated form rule path prefixes are written in
    pub fn path_key(path: &Path) -> String {
        path.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn line_of(text: &str, offset: usize) -> usize {
        text[..offset].matches('\n').count() + 1
    }

    /// Rewrite one file. `file` is relative to the run root; path guards match on it.
    pub fn rewrite(file: &Path, text: &str, table: &MappingTable) -> Result<FileRewrite> {
        let scan = Scan::new(text);
        let relative = path_key(file);
        let ctx = ResolveContext::new(&relative, text, table.template_prefixes());
        let mut change_set = ChangeSet::new(file);
        let mut conflicts = Vec::new();

        let code = scan
            .identifiers()
            .filter(|&i| table.is_candidate(scan.text(i)))
            .map(|i| scan.classify_token_with(i, table));
        let strings = scan
            .string_occurrences()
            .filter(|o| table.is_candidate(&o.text));

        for occurrence in code.chain(strings) {
            match resolve(&occurrence, table.candidates(&occurrence.text), &ctx) {
                Verdict::Rename(to) => {
                    let replacement = if occurrence.shorthand {
                        format!("{}: {}", occurrence.text, to)
                    } else {
                        to
                    };
                    change_set.push(occurrence.offset, occurrence.length, replacement);
                }
                Verdict::Conflict(candidates) => conflicts.push(conflict(file, text, &occurrence, candidates)),
                Verdict::Skip => {}
            }
        }

        let sites = create_sites_missing_id(&scan)?;
        let helper = &table.helper().name;
        let imports_needed = !sites.is_empty() && !declares(&scan, helper);

        if table.create_ids() {
            for open in sites {
                let (offset, insertion) = id_insertion(text, scan.tokens()[open].end, helper);
                change_set.push(offset, 0, insertion);
            }
        }

        let new_text = change_set.apply(text)?;
        Ok(FileRewrite {
            new_text,
            change_set,
            conflicts,
            imports_needed,
        })
    }

    fn conflict(file: &Path, text: &str, occurrence: &Occurrence, candidates: Vec<String>) -> ConflictRecord {
        ConflictRecord {
            file: file.to_path_buf(),
            offset: occurrence.offset,
            line: line_of(text, occurrence.offset),
            identifier: occurrence.text.clone(),
            role: if occurrence.shorthand { Role::ObjectKey } else { occurrence.role },
            candidates,
        }
    }

    /// Opening braces of `.create({ data: {` objects with no top-level `id`.
    ///
    /// A spread entry might carry the id, so objects with one are left alone.
    pub fn create_sites_missing_id(scan: &Scan<'_>) -> Result<Vec<usize>> {
        let pattern = Regex::new(r"\.create\(\s*\{\s*data\s*:\s*\{")?;
        let source = scan.source();
        let mut sites = Vec::new();

        for found in pattern.find_iter(source) {
            // Matches inside strings or comments have no brace token at the end.
            let Some(open) = scan.token_index_at(found.end() - 1) else {
                continue;
            };
            if !scan.tokens()[open].is_punct(source, "{") {
                continue;
            }
            let Some(close) = scan.matching(open) else {
                continue;
            };

            let mut has_id = false;
            for i in open + 1..close {
                if scan.enclosing(i) != Some(open) {
                    continue;
                }
                let token = scan.tokens()[i];
                if token.kind == TokenKind::Ident && scan.text(i) == "id" {
                    let occurrence = scan.classify_token(i);
                    if occurrence.role == Role::ObjectKey || occurrence.shorthand {
                        has_id = true;
                    }
                }
                if token.is_punct(source, ".") && i >= 2 && scan.tokens()[i - 1].is_punct(source, ".") {
                    has_id = true;
                }
            }
            if !has_id {
                sites.push(open);
            }
        }
        Ok(sites)
    }

    /// Where and what to insert so `id: helper(),` becomes the first entry after `{`
    fn id_insertion(text: &str, after_brace: usize, helper: &str) -> (usize, String) {
        let rest = &text[after_brace..];
        let ws_len = rest.len() - rest.trim_start().len();
        let whitespace = &rest[..ws_len];
        let empty = rest[ws_len..].starts_with('}');

        if let Some(newline) = whitespace.rfind('\n') {
            let indent = &whitespace[newline + 1..];
            if empty {
                // `{\n}`: the closing brace line has the outer indent; nest one level deeper.
                return (after_brace, format!("\n{indent}  id: {helper}(),"));
            }
            return (after_brace, format!("\n{indent}id: {helper}(),"));
        }
        if empty {
            (after_brace, format!(" id: {helper}() "))
        } else {
            (after_brace, format!(" id: {helper}(),"))
        }
    }
}
