// Copyright (C) Brian G. Milnes 2025

//! Rekey - follow a camelCase → snake_case schema rename through application code
//!
//! Rewrites identifiers only where their syntactic role says they are
//! schema-bound (object keys, member accesses, destructured bindings, opted-in
//! string segments), resolves overlapping rules by priority, adds the id helper
//! import that new create sites need, and repeats until a sweep changes nothing.

pub mod mapping;
pub mod builtin;
pub mod lexer;
pub mod classifier;
pub mod resolver;
pub mod rewrite;
pub mod injector;
pub mod report;
pub mod runner;
pub mod discovery;
pub mod logging;
pub mod tool_runner;

// Re-export commonly used items
pub use mapping::mapping::{Helper, MappingConfig, MappingTable, RelationRemap, RenameRule, Role, RoleSet};
pub use builtin::builtin::builtin_mapping;
pub use classifier::classifier::{classify, Occurrence, Scan};
pub use resolver::resolver::{resolve, ResolveContext, Verdict};
pub use rewrite::rewrite::{rewrite, ChangeSet, Edit, FileRewrite};
pub use injector::injector::{inject, Injection};
pub use report::report::{ConflictRecord, FileFailure, Outcome, RunReport};
pub use runner::runner::{PassRunner, RunConfig, RunState};
pub use discovery::discovery::{find_source_files, format_number, get_search_dirs};
pub use logging::logging::ToolLogger;
