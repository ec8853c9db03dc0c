// Copyright (C) Brian G. Milnes 2025

//! Import injector: add the helper declaration a rewritten file now needs
//!
//! The new line goes right after the last top-level `import`/`require`
//! declaration, or after any leading `'use client'`-style directives when the
//! file has no imports. A file that already binds the helper at top level is left as is,
//! so running the injector again never adds a second declaration.

pub mod injector {
    use crate::classifier::classifier::Scan;
    use crate::lexer::lexer::TokenKind;
    use crate::mapping::mapping::Helper;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Injection {
        pub text: String,
        pub injected: bool,
    }

    /// A top-level dependency declaration, as a token range and byte span
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Declaration {
        pub first_token: usize,
        pub last_token: usize,
        pub end: usize,
    }

    pub fn inject(text: &str, imports_needed: bool, helper: &Helper) -> Injection {
        let unchanged = || Injection {
            text: text.to_string(),
            injected: false,
        };
        if !imports_needed {
            return unchanged();
        }

        let scan = Scan::new(text);
        let declarations = top_level_declarations(&scan);
        if binds(&scan, &declarations, &helper.name) || defines(&scan, &helper.name) {
            return unchanged();
        }

        let at = match declarations.last() {
            Some(last) => line_end(text, last.end),
            None => after_directives(&scan),
        };

        let mut result = String::with_capacity(text.len() + helper.declaration.len() + 2);
        result.push_str(&text[..at]);
        if at > 0 && !text[..at].ends_with('\n') {
            result.push('\n');
        }
        result.push_str(&helper.declaration);
        result.push('\n');
        result.push_str(&text[at..]);

        Injection {
            text: result,
            injected: true,
        }
    }

    /// Does the file already bind `name` at top level, by import, `require`
    /// or its own `const`/`let`/`var`/`function`/`class` declaration?
    pub fn declares(scan: &Scan<'_>, name: &str) -> bool {
        binds(scan, &top_level_declarations(scan), name) || defines(scan, name)
    }

    /// `const name`, `function name`, `export class name` and the like outside any bracket
    fn defines(scan: &Scan<'_>, name: &str) -> bool {
        let source = scan.source();
        let tokens = scan.tokens();
        (0..tokens.len()).any(|i| {
            scan.enclosing(i).is_none()
                && ["const", "let", "var", "function", "class"]
                    .iter()
                    .any(|kw| tokens[i].is_ident(source, kw))
                && tokens.get(i + 1).is_some_and(|t| t.is_ident(source, name))
        })
    }

    fn binds(scan: &Scan<'_>, declarations: &[Declaration], name: &str) -> bool {
        declarations.iter().any(|d| {
            (d.first_token..=d.last_token)
                .any(|i| scan.tokens()[i].kind == TokenKind::Ident && scan.text(i) == name)
        })
    }

    /// Offset just past the newline that ends the line containing `offset`
    fn line_end(text: &str, offset: usize) -> usize {
        text[offset..]
            .find('\n')
            .map_or(text.len(), |p| offset + p + 1)
    }

    /// Offset after leading directive statements such as `'use client';`
    fn after_directives(scan: &Scan<'_>) -> usize {
        let source = scan.source();
        let tokens = scan.tokens();
        let mut at = 0;
        let mut i = 0;
        while i < tokens.len() && tokens[i].kind == TokenKind::Str {
            let text = tokens[i].text(source);
            if !(text.starts_with('\'') || text.starts_with('"')) {
                break;
            }
            let mut end = tokens[i].end;
            if tokens.get(i + 1).is_some_and(|t| t.is_punct(source, ";")) {
                end = tokens[i + 1].end;
                i += 1;
            }
            at = line_end(source, end);
            i += 1;
        }
        at
    }

    fn at_statement_start(scan: &Scan<'_>, index: usize) -> bool {
        let source = scan.source();
        match index.checked_sub(1) {
            None => true,
            Some(p) => {
                let prev = scan.tokens()[p];
                prev.is_punct(source, ";")
                    || prev.is_punct(source, "}")
                    || source[prev.end..scan.tokens()[index].start].contains('\n')
            }
        }
    }

    /// Every `import … from '…'`, `import '…'` and `const x = require('…')`
    /// statement outside any bracket.
    pub fn top_level_declarations(scan: &Scan<'_>) -> Vec<Declaration> {
        let source = scan.source();
        let tokens = scan.tokens();
        let mut found = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            if scan.enclosing(i).is_some() || tokens[i].kind != TokenKind::Ident || !at_statement_start(scan, i) {
                i += 1;
                continue;
            }
            let declaration = match scan.text(i) {
                "import" => import_declaration(scan, i),
                "const" | "let" | "var" => require_declaration(scan, i),
                _ => None,
            };
            match declaration {
                Some(d) => {
                    i = d.last_token + 1;
                    found.push(d);
                }
                None => i += 1,
            }
        }

        // Trailing semicolons belong to the declaration.
        for d in &mut found {
            if tokens.get(d.last_token + 1).is_some_and(|t| t.is_punct(source, ";")) {
                d.last_token += 1;
                d.end = tokens[d.last_token].end;
            }
        }
        found
    }

    fn import_declaration(scan: &Scan<'_>, start: usize) -> Option<Declaration> {
        let source = scan.source();
        let tokens = scan.tokens();
        let next = tokens.get(start + 1)?;
        // `import(` and `import.meta` are expressions.
        if next.is_punct(source, "(") || next.is_punct(source, ".") {
            return None;
        }
        if next.kind == TokenKind::Str {
            return Some(Declaration {
                first_token: start,
                last_token: start + 1,
                end: next.end,
            });
        }
        let mut j = start + 1;
        while j < tokens.len() {
            if scan.enclosing(j).is_none() && tokens[j].is_punct(source, ";") {
                return None;
            }
            if tokens[j].is_ident(source, "from") && scan.enclosing(j).is_none() {
                let specifier = tokens.get(j + 1)?;
                if specifier.kind != TokenKind::Str {
                    return None;
                }
                return Some(Declaration {
                    first_token: start,
                    last_token: j + 1,
                    end: specifier.end,
                });
            }
            j += 1;
        }
        None
    }

    fn require_declaration(scan: &Scan<'_>, start: usize) -> Option<Declaration> {
        let source = scan.source();
        let tokens = scan.tokens();
        let mut j = start + 1;
        while j < tokens.len() && !tokens[j].is_punct(source, "=") {
            if scan.enclosing(j).is_none() && tokens[j].is_punct(source, ";") {
                return None;
            }
            j += 1;
        }
        if !tokens.get(j + 1)?.is_ident(source, "require") || !tokens.get(j + 2)?.is_punct(source, "(") {
            return None;
        }
        let close = scan.matching(j + 2)?;
        Some(Declaration {
            first_token: start,
            last_token: close,
            end: tokens[close].end,
        })
    }
}
