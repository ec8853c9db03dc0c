// Copyright (C) Brian G. Milnes 2025

//! Mapping table: the authoritative old→new identifier renames
//!
//! A table is built once per run from a `MappingConfig` (the built-in one or a
//! JSON file) and never mutated afterwards. Construction validates the rule set;
//! a table that fails validation never reaches the pass runner.

pub mod mapping {
    use std::collections::HashMap;
    use std::fmt;
    use std::path::Path;

    use anyhow::{bail, Context, Result};
    use regex::Regex;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    /// JSON schema for mapping files
    pub const MAPPING_SCHEMA: &str = include_str!("../schemas/rekey-mapping.schema.json");

    /// Syntactic role of an identifier occurrence
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum Role {
        ObjectKey,
        MemberAccess,
        Destructure,
        TemplateSegment,
        Bare,
    }

    impl Role {
        pub const ALL: [Role; 5] = [
            Role::ObjectKey,
            Role::MemberAccess,
            Role::Destructure,
            Role::TemplateSegment,
            Role::Bare,
        ];

        fn bit(self) -> u8 {
            match self {
                Role::ObjectKey => 1,
                Role::MemberAccess => 1 << 1,
                Role::Destructure => 1 << 2,
                Role::TemplateSegment => 1 << 3,
                Role::Bare => 1 << 4,
            }
        }
    }

    impl fmt::Display for Role {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    /// A subset of roles a rule is allowed to rewrite
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(from = "Vec<Role>", into = "Vec<Role>")]
    pub struct RoleSet(u8);

    impl RoleSet {
        pub const EMPTY: RoleSet = RoleSet(0);
        /// Object keys and member accesses, the two places schema fields show up
        pub const FIELD: RoleSet = RoleSet(0b0011);

        pub fn of(roles: &[Role]) -> Self {
            RoleSet(roles.iter().fold(0, |bits, role| bits | role.bit()))
        }

        pub fn contains(self, role: Role) -> bool {
            self.0 & role.bit() != 0
        }

        pub fn overlaps(self, other: RoleSet) -> bool {
            self.0 & other.0 != 0
        }

        pub fn is_empty(self) -> bool {
            self.0 == 0
        }

        pub fn roles(self) -> Vec<Role> {
            Role::ALL.into_iter().filter(|r| self.contains(*r)).collect()
        }
    }

    impl From<Vec<Role>> for RoleSet {
        fn from(roles: Vec<Role>) -> Self {
            RoleSet::of(&roles)
        }
    }

    impl From<RoleSet> for Vec<Role> {
        fn from(set: RoleSet) -> Self {
            set.roles()
        }
    }

    fn default_scope() -> RoleSet {
        RoleSet::FIELD
    }

    /// One rename: `from` becomes `to` wherever the occurrence role is in `scope`
    /// and every guard holds.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RenameRule {
        pub from: String,
        pub to: String,
        #[serde(default = "default_scope")]
        pub scope: RoleSet,
        #[serde(default)]
        pub priority: i32,
        /// May expand `{ from }` into `{ from: to }`
        #[serde(default)]
        pub shorthand_safe: bool,
        /// Member access only: the token before the dot must be this name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub receiver: Option<String>,
        /// Only files whose run-relative path starts with this prefix
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub path_prefix: Option<String>,
        /// Only files whose text contains this marker
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub file_marker: Option<String>,
        /// Only keys of `include`/`select`-shaped blocks
        #[serde(default)]
        pub structural_only: bool,
    }

    impl RenameRule {
        pub fn new(from: &str, to: &str, scope: RoleSet) -> Self {
            RenameRule {
                from: from.to_string(),
                to: to.to_string(),
                scope,
                priority: 0,
                shorthand_safe: false,
                receiver: None,
                path_prefix: None,
                file_marker: None,
                structural_only: false,
            }
        }

        pub fn priority(mut self, priority: i32) -> Self {
            self.priority = priority;
            self
        }

        pub fn shorthand_safe(mut self) -> Self {
            self.shorthand_safe = true;
            self
        }

        pub fn receiver(mut self, receiver: &str) -> Self {
            self.receiver = Some(receiver.to_string());
            self
        }

        pub fn path_prefix(mut self, prefix: &str) -> Self {
            self.path_prefix = Some(prefix.to_string());
            self
        }

        pub fn file_marker(mut self, marker: &str) -> Self {
            self.file_marker = Some(marker.to_string());
            self
        }

        pub fn structural_only(mut self) -> Self {
            self.structural_only = true;
            self
        }

        /// True when both rules are gated by exactly the same conditions
        fn same_guards(&self, other: &RenameRule) -> bool {
            self.shorthand_safe == other.shorthand_safe
                && self.receiver == other.receiver
                && self.path_prefix == other.path_prefix
                && self.file_marker == other.file_marker
                && self.structural_only == other.structural_only
        }
    }

    impl fmt::Display for RenameRule {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let scope: Vec<String> = self.scope.roles().iter().map(|r| r.to_string()).collect();
            write!(f, "{} -> {} [{}] priority {}", self.from, self.to, scope.join(", "), self.priority)?;
            if self.structural_only {
                write!(f, " structural")?;
            }
            if let Some(ref receiver) = self.receiver {
                write!(f, " receiver={receiver}")?;
            }
            if let Some(ref prefix) = self.path_prefix {
                write!(f, " path={prefix}")?;
            }
            if let Some(ref marker) = self.file_marker {
                write!(f, " marker={marker:?}")?;
            }
            Ok(())
        }
    }

    /// A relation rename, only honoured inside structural blocks
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RelationRemap {
        pub from: String,
        pub to: String,
        #[serde(default)]
        pub priority: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub path_prefix: Option<String>,
    }

    impl RelationRemap {
        pub fn new(from: &str, to: &str) -> Self {
            RelationRemap {
                from: from.to_string(),
                to: to.to_string(),
                priority: 0,
                path_prefix: None,
            }
        }

        pub fn path_prefix(mut self, prefix: &str) -> Self {
            self.path_prefix = Some(prefix.to_string());
            self
        }

        fn to_rule(&self) -> RenameRule {
            RenameRule {
                from: self.from.clone(),
                to: self.to.clone(),
                scope: RoleSet::of(&[Role::ObjectKey]),
                priority: self.priority,
                shorthand_safe: false,
                receiver: None,
                path_prefix: self.path_prefix.clone(),
                file_marker: None,
                structural_only: true,
            }
        }
    }

    /// The helper a create site needs for its generated identifier
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Helper {
        /// Canonical binding name, e.g. `uuidv4`
        pub name: String,
        /// Full declaration line inserted by the import injector
        pub declaration: String,
    }

    impl Default for Helper {
        fn default() -> Self {
            Helper {
                name: "uuidv4".to_string(),
                declaration: "import { v4 as uuidv4 } from 'uuid';".to_string(),
            }
        }
    }

    fn default_containers() -> Vec<String> {
        vec!["include".to_string(), "select".to_string(), "_count".to_string()]
    }

    /// Serializable form of a mapping table
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MappingConfig {
        #[serde(default)]
        pub fields: Vec<RenameRule>,
        #[serde(default)]
        pub relations: Vec<RelationRemap>,
        #[serde(default = "default_containers")]
        pub structural_containers: Vec<String>,
        #[serde(default)]
        pub template_prefixes: Vec<String>,
        #[serde(default)]
        pub helper: Helper,
        /// Insert `id: <helper>()` into create calls that lack one
        #[serde(default)]
        pub create_ids: bool,
    }

    impl Default for MappingConfig {
        fn default() -> Self {
            MappingConfig {
                fields: Vec::new(),
                relations: Vec::new(),
                structural_containers: default_containers(),
                template_prefixes: Vec::new(),
                helper: Helper::default(),
                create_ids: false,
            }
        }
    }

    /// Validated, read-only rule set shared by every worker of a run
    #[derive(Debug, Clone)]
    pub struct MappingTable {
        rules: Vec<RenameRule>,
        by_from: HashMap<String, Vec<RenameRule>>,
        containers: Vec<String>,
        template_prefixes: Vec<String>,
        helper: Helper,
        create_ids: bool,
    }

    impl MappingTable {
        /// Build and validate a table
        pub fn new(config: MappingConfig) -> Result<Self> {
            let mut rules = config.fields;
            rules.extend(config.relations.iter().map(RelationRemap::to_rule));

            validate(&rules, &config.helper)?;

            let mut by_from: HashMap<String, Vec<RenameRule>> = HashMap::new();
            for rule in &rules {
                by_from.entry(rule.from.clone()).or_default().push(rule.clone());
            }

            Ok(MappingTable {
                rules,
                by_from,
                containers: config.structural_containers,
                template_prefixes: config.template_prefixes,
                helper: config.helper,
                create_ids: config.create_ids,
            })
        }

        /// Load a table from a JSON mapping file
        pub fn from_file(path: &Path) -> Result<Self> {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
            Self::from_json(&content)
                .with_context(|| format!("Invalid mapping file: {}", path.display()))
        }

        /// Load a table from JSON text, checking it against the mapping schema first
        pub fn from_json(json: &str) -> Result<Self> {
            let data: Value = serde_json::from_str(json).context("Failed to parse mapping JSON")?;
            let problems = schema_errors(&data)?;
            if !problems.is_empty() {
                bail!("Mapping does not match schema:\n  - {}", problems.join("\n  - "));
            }
            let config: MappingConfig = serde_json::from_value(data).context("Failed to decode mapping")?;
            Self::new(config)
        }

        pub fn rules(&self) -> &[RenameRule] {
            &self.rules
        }

        /// Every rule whose `from` equals `text`
        pub fn candidates(&self, text: &str) -> &[RenameRule] {
            self.by_from.get(text).map(Vec::as_slice).unwrap_or(&[])
        }

        pub fn is_candidate(&self, text: &str) -> bool {
            self.by_from.contains_key(text)
        }

        pub fn is_container(&self, key: &str) -> bool {
            self.containers.iter().any(|c| c == key)
        }

        pub fn template_prefixes(&self) -> &[String] {
            &self.template_prefixes
        }

        pub fn helper(&self) -> &Helper {
            &self.helper
        }

        pub fn create_ids(&self) -> bool {
            self.create_ids
        }
    }

    /// Schema violations of a mapping document, one message per error
    pub fn schema_errors(data: &Value) -> Result<Vec<String>> {
        let schema: Value = serde_json::from_str(MAPPING_SCHEMA).context("Failed to parse mapping schema")?;
        let validator = jsonschema::validator_for(&schema).context("Failed to compile mapping schema")?;
        Ok(validator.iter_errors(data).map(|e| e.to_string()).collect())
    }

    fn validate(rules: &[RenameRule], helper: &Helper) -> Result<()> {
        let ident = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").context("identifier pattern")?;
        let mut problems = Vec::new();

        if !ident.is_match(&helper.name) {
            problems.push(format!("helper name {:?} is not an identifier", helper.name));
        }

        for rule in rules {
            if !ident.is_match(&rule.from) {
                problems.push(format!("{rule}: {:?} is not an identifier", rule.from));
            }
            if !ident.is_match(&rule.to) {
                problems.push(format!("{rule}: {:?} is not an identifier", rule.to));
            }
            if rule.from == rule.to {
                problems.push(format!("{rule}: renames to itself"));
            }
            if rule.scope.is_empty() {
                problems.push(format!("{rule}: empty scope"));
            }
            if rule.scope.contains(Role::Bare) {
                problems.push(format!("{rule}: Bare occurrences are never rewritten"));
            }
        }

        // Two rules that can never be told apart must not disagree.
        for (i, a) in rules.iter().enumerate() {
            for b in &rules[i + 1..] {
                if a.from == b.from
                    && a.to != b.to
                    && a.priority == b.priority
                    && a.scope.overlaps(b.scope)
                    && a.same_guards(b)
                {
                    problems.push(format!("ambiguous rules: {a} / {b}"));
                }
            }
        }

        if !problems.is_empty() {
            bail!("Malformed mapping table:\n  - {}", problems.join("\n  - "));
        }
        Ok(())
    }
}
