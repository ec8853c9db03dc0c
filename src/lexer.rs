// Copyright (C) Brian G. Milnes 2025

//! Light tokenizer for TypeScript/JavaScript sources
//!
//! Not a parser. It only needs to tell code identifiers apart from string
//! contents and comments, and to expose brackets and punctuation with byte
//! offsets so the classifier can look around an identifier.
//!
//! Quoted strings end at an unescaped newline, so a stray apostrophe in JSX
//! text damages at most one line.

pub mod lexer {

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TokenKind {
        Ident,
        /// Single punctuation character, or one of `?.` and `${`
        Punct,
        /// A quoted string, or one literal chunk of a template string
        Str,
        Regex,
        Number,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Token {
        pub kind: TokenKind,
        pub start: usize,
        pub end: usize,
    }

    impl Token {
        pub fn text<'a>(&self, source: &'a str) -> &'a str {
            &source[self.start..self.end]
        }

        pub fn is_punct(&self, source: &str, punct: &str) -> bool {
            self.kind == TokenKind::Punct && self.text(source) == punct
        }

        pub fn is_ident(&self, source: &str, name: &str) -> bool {
            self.kind == TokenKind::Ident && self.text(source) == name
        }
    }

    /// An identifier-shaped run inside a string literal
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StringWord {
        pub start: usize,
        pub end: usize,
        /// Offset just past the opening quote of the enclosing literal
        pub literal_start: usize,
    }

    #[derive(Debug, Default)]
    pub struct Lexed {
        pub tokens: Vec<Token>,
        pub words: Vec<StringWord>,
    }

    /// Keywords after which a `/` starts a regular expression
    const REGEX_PREFIX_KEYWORDS: &[&str] = &[
        "return", "typeof", "case", "do", "else", "in", "of", "new", "delete", "void", "throw",
        "instanceof", "yield", "await",
    ];

    pub fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_' || b == b'$'
    }

    pub fn is_ident_continue(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
    }

    struct Interpolation {
        literal_start: usize,
        depth: usize,
    }

    struct Lexer<'a> {
        source: &'a str,
        bytes: &'a [u8],
        pos: usize,
        out: Lexed,
        interpolations: Vec<Interpolation>,
    }

    pub fn lex(source: &str) -> Lexed {
        let mut lexer = Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            out: Lexed::default(),
            interpolations: Vec::new(),
        };
        lexer.run();
        lexer.out
    }

    impl<'a> Lexer<'a> {
        fn peek(&self, offset: usize) -> Option<u8> {
            self.bytes.get(self.pos + offset).copied()
        }

        fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
            self.out.tokens.push(Token { kind, start, end });
        }

        fn run(&mut self) {
            while let Some(b) = self.peek(0) {
                match b {
                    _ if b.is_ascii_whitespace() => self.pos += 1,
                    b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                    b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                    b'/' if self.regex_allowed() => self.regex(),
                    b'\'' | b'"' => self.quoted(b),
                    b'`' => {
                        let start = self.pos;
                        self.pos += 1;
                        self.template_chunk(start, self.pos);
                    }
                    b'{' => {
                        if let Some(frame) = self.interpolations.last_mut() {
                            frame.depth += 1;
                        }
                        self.punct(1);
                    }
                    b'}' => self.close_brace(),
                    b'?' if self.peek(1) == Some(b'.') && !self.peek(2).is_some_and(|c| c.is_ascii_digit()) => {
                        self.punct(2)
                    }
                    _ if is_ident_start(b) => self.ident(),
                    _ if b.is_ascii_digit() => self.number(),
                    _ if b.is_ascii() => self.punct(1),
                    _ => self.skip_char(),
                }
            }
        }

        fn punct(&mut self, len: usize) {
            let start = self.pos;
            self.pos += len;
            self.push(TokenKind::Punct, start, self.pos);
        }

        fn skip_char(&mut self) {
            self.pos += 1;
            while self.peek(0).is_some_and(|b| b & 0xC0 == 0x80) {
                self.pos += 1;
            }
        }

        fn skip_line_comment(&mut self) {
            while let Some(b) = self.peek(0) {
                if b == b'\n' {
                    break;
                }
                self.pos += 1;
            }
        }

        fn skip_block_comment(&mut self) {
            self.pos += 2;
            while self.pos < self.bytes.len() {
                if self.peek(0) == Some(b'*') && self.peek(1) == Some(b'/') {
                    self.pos += 2;
                    return;
                }
                self.pos += 1;
            }
        }

        fn ident(&mut self) {
            let start = self.pos;
            while self.peek(0).is_some_and(is_ident_continue) {
                self.pos += 1;
            }
            self.push(TokenKind::Ident, start, self.pos);
        }

        fn number(&mut self) {
            let start = self.pos;
            while self
                .peek(0)
                .is_some_and(|b| is_ident_continue(b) || b == b'.')
            {
                self.pos += 1;
            }
            self.push(TokenKind::Number, start, self.pos);
        }

        fn regex_allowed(&self) -> bool {
            let Some(prev) = self.out.tokens.last() else {
                return true;
            };
            match prev.kind {
                TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&prev.text(self.source)),
                // `</` closes a JSX element
                TokenKind::Punct => !matches!(prev.text(self.source), ")" | "]" | "}" | "<"),
                _ => false,
            }
        }

        fn regex(&mut self) {
            let start = self.pos;
            self.pos += 1;
            let mut in_class = false;
            while let Some(b) = self.peek(0) {
                match b {
                    b'\\' => self.pos += 1,
                    b'\n' => break,
                    b'[' => in_class = true,
                    b']' => in_class = false,
                    b'/' if !in_class => {
                        self.pos += 1;
                        while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
                            self.pos += 1;
                        }
                        self.push(TokenKind::Regex, start, self.pos);
                        return;
                    }
                    _ => {}
                }
                self.pos += 1;
            }
            self.pos = self.pos.min(self.bytes.len());
            self.push(TokenKind::Regex, start, self.pos);
        }

        fn quoted(&mut self, quote: u8) {
            let start = self.pos;
            self.pos += 1;
            let literal_start = self.pos;
            while let Some(b) = self.peek(0) {
                if b == quote {
                    self.pos += 1;
                    break;
                }
                if b == b'\n' {
                    break;
                }
                if b == b'\\' {
                    self.pos = (self.pos + 2).min(self.bytes.len());
                    continue;
                }
                if is_ident_start(b) {
                    self.string_word(literal_start);
                    continue;
                }
                self.pos += 1;
            }
            self.push(TokenKind::Str, start, self.pos);
        }

        /// Scan template text from `pos` up to the closing backtick or the next `${`.
        fn template_chunk(&mut self, start: usize, literal_start: usize) {
            while let Some(b) = self.peek(0) {
                match b {
                    b'`' => {
                        self.pos += 1;
                        self.push(TokenKind::Str, start, self.pos);
                        return;
                    }
                    b'$' if self.peek(1) == Some(b'{') => {
                        self.push(TokenKind::Str, start, self.pos);
                        self.punct(2);
                        self.interpolations.push(Interpolation { literal_start, depth: 0 });
                        return;
                    }
                    b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                    _ if is_ident_start(b) => self.string_word(literal_start),
                    _ => self.pos += 1,
                }
            }
            self.push(TokenKind::Str, start, self.pos);
        }

        fn string_word(&mut self, literal_start: usize) {
            let start = self.pos;
            while self.peek(0).is_some_and(is_ident_continue) {
                self.pos += 1;
            }
            self.out.words.push(StringWord { start, end: self.pos, literal_start });
        }

        fn close_brace(&mut self) {
            match self.interpolations.last_mut() {
                Some(frame) if frame.depth == 0 => {
                    let literal_start = frame.literal_start;
                    self.interpolations.pop();
                    self.punct(1);
                    let chunk_start = self.pos;
                    self.template_chunk(chunk_start, literal_start);
                }
                Some(frame) => {
                    frame.depth -= 1;
                    self.punct(1);
                }
                None => self.punct(1),
            }
        }
    }

}
