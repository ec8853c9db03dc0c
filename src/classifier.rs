// Copyright (C) Brian G. Milnes 2025

//! Context classifier: decides the syntactic role of an identifier occurrence
//!
//! Works from local cues (the tokens either side of the identifier) plus
//! bracket matching, never from a full parse:
//! - `{`/`,`/`;`/line start before, `:` after, innermost `{`  → ObjectKey
//! - `.` or `?.` before                                      → MemberAccess
//! - binding pattern, `{`/`,` before, `,`/`}`/`=` after        → Destructure
//! - inside a string or template text                        → TemplateSegment
//! - anything else                                           → Bare
//!
//! Shorthand entries `{ foo }` of plain object literals stay Bare but carry a
//! `shorthand` tag so a shorthand-safe rule can still pick them up.

pub mod classifier {
    use crate::lexer::lexer::{lex, Lexed, Token, TokenKind};
    use crate::mapping::mapping::Role;

    /// One classified identifier occurrence
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Occurrence {
        pub offset: usize,
        pub length: usize,
        pub text: String,
        pub role: Role,
        /// `{ foo }` shorthand entry of an object literal
        pub shorthand: bool,
        /// Key of a block that is the value of a structural container key
        pub structural: bool,
        /// Identifier before the dot of a member access
        pub receiver: Option<String>,
        /// Literal text from the opening quote up to the word, for TemplateSegment
        pub string_prefix: Option<String>,
    }

    /// Container keys whose object value is a structural block
    pub trait ContainerKeys {
        fn is_container(&self, key: &str) -> bool;
    }

    impl ContainerKeys for [&str] {
        fn is_container(&self, key: &str) -> bool {
            self.contains(&key)
        }
    }

    impl ContainerKeys for crate::mapping::mapping::MappingTable {
        fn is_container(&self, key: &str) -> bool {
            crate::mapping::mapping::MappingTable::is_container(self, key)
        }
    }

    const DEFAULT_CONTAINERS: &[&str] = &["include", "select", "_count"];

    /// A whole file, lexed and bracket-matched once
    pub struct Scan<'a> {
        source: &'a str,
        lexed: Lexed,
        /// Innermost open bracket enclosing each token
        enclosing: Vec<Option<usize>>,
        /// Closing token of each opening bracket
        matching: Vec<Option<usize>>,
        /// Whether each `{` opens a binding pattern
        pattern: Vec<bool>,
    }

    impl<'a> Scan<'a> {
        pub fn new(source: &'a str) -> Self {
            let lexed = lex(source);
            let count = lexed.tokens.len();
            let mut enclosing = vec![None; count];
            let mut matching = vec![None; count];
            let mut stack: Vec<usize> = Vec::new();

            for (i, token) in lexed.tokens.iter().enumerate() {
                enclosing[i] = stack.last().copied();
                if token.kind != TokenKind::Punct {
                    continue;
                }
                match token.text(source) {
                    "{" | "(" | "[" | "${" => stack.push(i),
                    closer @ ("}" | ")" | "]") => {
                        let opener = match closer {
                            "}" => ["{", "${"],
                            ")" => ["(", "("],
                            _ => ["[", "["],
                        };
                        // Pop to the nearest matching opener; stray closers are ignored.
                        if let Some(depth) = stack
                            .iter()
                            .rposition(|&o| opener.contains(&lexed.tokens[o].text(source)))
                        {
                            let open = stack[depth];
                            stack.truncate(depth);
                            matching[open] = Some(i);
                            enclosing[i] = stack.last().copied();
                        }
                    }
                    _ => {}
                }
            }

            let mut scan = Scan {
                source,
                lexed,
                enclosing,
                matching,
                pattern: vec![false; count],
            };
            for i in 0..count {
                if scan.is_punct(i, "{") {
                    let opens = scan.opens_pattern(i);
                    scan.pattern[i] = opens;
                }
            }
            scan
        }

        pub fn source(&self) -> &'a str {
            self.source
        }

        pub fn tokens(&self) -> &[Token] {
            &self.lexed.tokens
        }

        pub fn text(&self, index: usize) -> &'a str {
            self.lexed.tokens[index].text(self.source)
        }

        pub fn enclosing(&self, index: usize) -> Option<usize> {
            self.enclosing.get(index).copied().flatten()
        }

        pub fn matching(&self, index: usize) -> Option<usize> {
            self.matching.get(index).copied().flatten()
        }

        pub fn token_index_at(&self, offset: usize) -> Option<usize> {
            self.lexed
                .tokens
                .binary_search_by_key(&offset, |t| t.start)
                .ok()
        }

        fn token(&self, index: usize) -> Option<&Token> {
            self.lexed.tokens.get(index)
        }

        fn is_punct(&self, index: usize, punct: &str) -> bool {
            self.token(index).is_some_and(|t| t.is_punct(self.source, punct))
        }

        fn is_ident(&self, index: usize, name: &str) -> bool {
            self.token(index).is_some_and(|t| t.is_ident(self.source, name))
        }

        fn prev(&self, index: usize) -> Option<usize> {
            index.checked_sub(1)
        }

        /// True when `a` and `b` touch with nothing between them
        fn adjacent(&self, a: usize, b: usize) -> bool {
            match (self.token(a), self.token(b)) {
                (Some(x), Some(y)) => x.end == y.start,
                _ => false,
            }
        }

        fn starts_line(&self, index: usize) -> bool {
            match self.prev(index) {
                None => true,
                Some(p) => self.source[self.lexed.tokens[p].end..self.lexed.tokens[index].start].contains('\n'),
            }
        }

        /// A single `=` (not `==`, `=>`) follows `index`
        fn followed_by_assign(&self, index: usize) -> bool {
            let next = index + 1;
            self.is_punct(next, "=")
                && !(self.adjacent(next, next + 1) && (self.is_punct(next + 1, "=") || self.is_punct(next + 1, ">")))
        }

        fn followed_by_arrow(&self, index: usize) -> bool {
            self.is_punct(index + 1, "=")
                && self.adjacent(index + 1, index + 2)
                && self.is_punct(index + 2, ">")
        }

        fn opens_pattern(&self, open: usize) -> bool {
            let prev = self.prev(open);

            if let Some(p) = prev {
                if ["const", "let", "var"].iter().any(|kw| self.is_ident(p, kw)) {
                    return true;
                }
            }

            if let Some(close) = self.matching(open) {
                if self.followed_by_assign(close) {
                    return true;
                }
            }

            match self.enclosing(open) {
                // Parameter list: `({ a }) =>` or `method({ a }) {`
                Some(outer) if self.is_punct(outer, "(") => {
                    let after_open_or_comma = prev.is_some_and(|p| p == outer || self.is_punct(p, ","));
                    after_open_or_comma
                        && self.matching(outer).is_some_and(|close| {
                            self.followed_by_arrow(close) || self.is_punct(close + 1, "{")
                        })
                }
                // Nested pattern: `{ a: { b } } = x`
                Some(outer) if self.is_punct(outer, "{") => {
                    self.pattern[outer] && prev.is_some_and(|p| self.is_punct(p, ":"))
                }
                _ => false,
            }
        }

        /// Braces of `import { a } from`, `export { a }` and `enum E { A }`
        fn is_name_list(&self, open: usize) -> bool {
            let Some(p) = self.prev(open) else {
                return false;
            };
            if ["import", "export", "type"].iter().any(|kw| self.is_ident(p, kw)) {
                return true;
            }
            // `import React, { useState }`
            if self.is_punct(p, ",") && p >= 2 && self.is_ident(p - 2, "import") {
                return true;
            }
            p >= 1 && self.is_ident(p - 1, "enum")
        }

        /// `open` starts an object literal: the `{` sits where an expression is expected.
        ///
        /// Block bodies (`) {`, `=> {`, `else {`), JSX children (`>{`) and JSX
        /// attribute values (`prop={`) are not object literals.
        fn opens_object_literal(&self, open: usize) -> bool {
            let Some(p) = self.prev(open) else {
                return false;
            };
            if ["return", "yield", "await"].iter().any(|kw| self.is_ident(p, kw)) {
                return true;
            }
            let token = self.lexed.tokens[p];
            if token.kind != TokenKind::Punct {
                return false;
            }
            match token.text(self.source) {
                "(" | "," | "[" | "?" | "|" | "&" | "." => true,
                "=" => !self.in_jsx_tag(p),
                ":" => !self.after_case_label(p),
                _ => false,
            }
        }

        /// `eq` is the `=` of a JSX attribute: `<Input value={...}`
        fn in_jsx_tag(&self, eq: usize) -> bool {
            let level = self.enclosing(eq);
            let mut j = eq;
            while let Some(i) = self.prev(j) {
                j = i;
                if self.enclosing(i) != level {
                    if Some(i) == level {
                        return false;
                    }
                    continue;
                }
                let token = self.lexed.tokens[i];
                match token.kind {
                    TokenKind::Ident | TokenKind::Str | TokenKind::Number => {}
                    TokenKind::Punct => match token.text(self.source) {
                        "<" => return self.token(i + 1).is_some_and(|t| t.kind == TokenKind::Ident) && self.adjacent(i, i + 1),
                        "=" | "-" | "." | ":" | "{" | "}" => {}
                        _ => return false,
                    },
                    TokenKind::Regex => return false,
                }
            }
            false
        }

        /// `colon` ends a `case …:` or `default:` label, so a `{` after it is a block
        fn after_case_label(&self, colon: usize) -> bool {
            let level = self.enclosing(colon);
            let mut j = colon;
            while let Some(i) = self.prev(j) {
                j = i;
                if Some(i) == level {
                    return false;
                }
                if self.enclosing(i) != level {
                    continue;
                }
                if self.is_ident(i, "case") || self.is_ident(i, "default") {
                    return true;
                }
                if [",", ";", "{", "}"].iter().any(|p| self.is_punct(i, p)) {
                    return false;
                }
            }
            false
        }

        /// `open` is the value of a container key: `include: {`
        fn is_structural_block<C: ContainerKeys + ?Sized>(&self, open: usize, containers: &C) -> bool {
            let Some(colon) = self.prev(open) else {
                return false;
            };
            if !self.is_punct(colon, ":") {
                return false;
            }
            let Some(key) = self.prev(colon) else {
                return false;
            };
            self.token(key).is_some_and(|t| t.kind == TokenKind::Ident) && containers.is_container(self.text(key))
        }

        /// Indices of every identifier token
        pub fn identifiers(&self) -> impl Iterator<Item = usize> + '_ {
            self.lexed
                .tokens
                .iter()
                .enumerate()
                .filter(|(_, t)| t.kind == TokenKind::Ident)
                .map(|(i, _)| i)
        }

        /// Classify an identifier token, using the default container keys
        pub fn classify_token(&self, index: usize) -> Occurrence {
            self.classify_token_with(index, DEFAULT_CONTAINERS)
        }

        pub fn classify_token_with<C: ContainerKeys + ?Sized>(&self, index: usize, containers: &C) -> Occurrence {
            let token = self.lexed.tokens[index];
            let mut occurrence = Occurrence {
                offset: token.start,
                length: token.end - token.start,
                text: token.text(self.source).to_string(),
                role: Role::Bare,
                shorthand: false,
                structural: false,
                receiver: None,
                string_prefix: None,
            };

            let prev = self.prev(index);
            let next = index + 1;

            if let Some(p) = prev {
                let dot = self.is_punct(p, "?.")
                    || (self.is_punct(p, ".") && !p.checked_sub(1).is_some_and(|pp| self.is_punct(pp, ".")));
                if dot {
                    occurrence.role = Role::MemberAccess;
                    occurrence.receiver = p
                        .checked_sub(1)
                        .filter(|&r| self.lexed.tokens[r].kind == TokenKind::Ident)
                        .map(|r| self.text(r).to_string());
                    return occurrence;
                }
            }

            let Some(open) = self.enclosing(index) else {
                return occurrence;
            };
            if !self.is_punct(open, "{") || self.is_name_list(open) {
                return occurrence;
            }

            let after_entry_start = prev.is_some_and(|p| self.is_punct(p, "{") || self.is_punct(p, ","));
            let ternary_or_case = prev.is_some_and(|p| self.is_punct(p, "?") || self.is_ident(p, "case"));
            let key_start = !ternary_or_case
                && (after_entry_start || prev.is_some_and(|p| self.is_punct(p, ";")) || self.starts_line(index));
            // `key:` or the optional-property form `key?:`
            let colon_follows = self.is_punct(next, ":") || (self.is_punct(next, "?") && self.is_punct(next + 1, ":"));

            if key_start && colon_follows {
                occurrence.role = Role::ObjectKey;
                occurrence.structural = self.is_structural_block(open, containers);
                return occurrence;
            }

            let entry_end = self.is_punct(next, ",") || self.is_punct(next, "}");
            if self.pattern[open] {
                if after_entry_start && (entry_end || self.is_punct(next, "=")) {
                    occurrence.role = Role::Destructure;
                }
            } else if after_entry_start && entry_end && self.opens_object_literal(open) {
                occurrence.shorthand = true;
                occurrence.structural = self.is_structural_block(open, containers);
            }
            occurrence
        }

        /// Every identifier-shaped word inside string and template text
        pub fn string_occurrences(&self) -> impl Iterator<Item = Occurrence> + '_ {
            self.lexed.words.iter().map(|word| Occurrence {
                offset: word.start,
                length: word.end - word.start,
                text: self.source[word.start..word.end].to_string(),
                role: Role::TemplateSegment,
                shorthand: false,
                structural: false,
                receiver: None,
                string_prefix: Some(self.source[word.literal_start..word.start].to_string()),
            })
        }

        /// The occurrence covering exactly `offset..offset + length`, if any
        pub fn occurrence_at(&self, offset: usize, length: usize) -> Option<Occurrence> {
            if let Some(index) = self.token_index_at(offset) {
                let token = self.lexed.tokens[index];
                if token.kind == TokenKind::Ident && token.end == offset + length {
                    return Some(self.classify_token(index));
                }
            }
            self.string_occurrences()
                .find(|o| o.offset == offset && o.length == length)
        }
    }

    /// Role of the identifier spanning `offset..offset + length` in `source`.
    ///
    /// Spans that are not an identifier (comments, partial words) are Bare.
    pub fn classify(source: &str, offset: usize, length: usize) -> Role {
        Scan::new(source)
            .occurrence_at(offset, length)
            .map_or(Role::Bare, |o| o.role)
    }
}
