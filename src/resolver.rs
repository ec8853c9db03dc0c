// Copyright (C) Brian G. Milnes 2025

//! Rule resolver: one verdict per occurrence
//!
//! Rules are filtered by identifier, role and guards. Survivors that agree on
//! the target collapse; otherwise the strictly highest priority wins, and a tie
//! at the top is a Conflict that the engine leaves untouched.

pub mod resolver {
    use serde::{Deserialize, Serialize};

    use crate::classifier::classifier::Occurrence;
    use crate::mapping::mapping::{RenameRule, Role};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Verdict {
        Rename(String),
        Skip,
        /// Distinct targets of the tied top-priority rules, sorted
        Conflict(Vec<String>),
    }

    /// Per-file facts the guards need
    #[derive(Debug, Clone, Copy)]
    pub struct ResolveContext<'a> {
        /// Path relative to the run root, `/`-separated
        pub relative_path: &'a str,
        /// File text at the start of the pass
        pub text: &'a str,
        pub template_prefixes: &'a [String],
    }

    impl<'a> ResolveContext<'a> {
        pub fn new(relative_path: &'a str, text: &'a str, template_prefixes: &'a [String]) -> Self {
            ResolveContext {
                relative_path,
                text,
                template_prefixes,
            }
        }
    }

    /// Does `rule` apply to `occurrence` in this file?
    pub fn applies(rule: &RenameRule, occurrence: &Occurrence, ctx: &ResolveContext<'_>) -> bool {
        if rule.from != occurrence.text {
            return false;
        }

        let role_ok = if occurrence.shorthand {
            rule.shorthand_safe && rule.scope.contains(Role::ObjectKey)
        } else {
            occurrence.role != Role::Bare && rule.scope.contains(occurrence.role)
        };
        if !role_ok {
            return false;
        }

        if rule.structural_only && !occurrence.structural {
            return false;
        }

        if occurrence.role == Role::TemplateSegment {
            let prefix = occurrence.string_prefix.as_deref().unwrap_or("");
            if !ctx.template_prefixes.iter().any(|p| prefix.starts_with(p.as_str())) {
                return false;
            }
        }

        if let Some(ref receiver) = rule.receiver {
            if occurrence.role != Role::MemberAccess || occurrence.receiver.as_ref() != Some(receiver) {
                return false;
            }
        }

        if let Some(ref prefix) = rule.path_prefix {
            if !ctx.relative_path.starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(ref marker) = rule.file_marker {
            if !ctx.text.contains(marker.as_str()) {
                return false;
            }
        }

        true
    }

    pub fn resolve(occurrence: &Occurrence, candidates: &[RenameRule], ctx: &ResolveContext<'_>) -> Verdict {
        let matching: Vec<&RenameRule> = candidates
            .iter()
            .filter(|rule| applies(rule, occurrence, ctx))
            .collect();

        let Some(first) = matching.first() else {
            return Verdict::Skip;
        };
        if matching.iter().all(|rule| rule.to == first.to) {
            return Verdict::Rename(first.to.clone());
        }

        let top = matching.iter().map(|rule| rule.priority).max().unwrap_or_default();
        let mut targets: Vec<String> = matching
            .iter()
            .filter(|rule| rule.priority == top)
            .map(|rule| rule.to.clone())
            .collect();
        targets.sort();
        targets.dedup();

        if targets.len() == 1 {
            Verdict::Rename(targets.remove(0))
        } else {
            Verdict::Conflict(targets)
        }
    }
}
