//! Lexer (spec §4.5): produces the §6.3 token alphabet, skips whitespace
//! and comments, and maintains a stack of input sources so `#include`
//! can nest. Structure (byte-slice source, running `pos`, accumulated
//! `diagnostics`) follows the teacher's `src/lexer.rs`.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::diagnostic::{Category, Diagnostic, SourceMap};
use crate::span::Span;
use crate::token::{is_name_continue, is_name_start, Lexeme};

struct Frame {
    source_id: u16,
    bytes: Vec<u8>,
    pos: usize,
    dir: PathBuf,
}

pub struct Token {
    pub lexeme: Lexeme,
    pub span: Span,
}

pub struct Lexer {
    stack: Vec<Frame>,
    pub sources: SourceMap,
    pub diagnostics: Vec<Diagnostic>,
    debug: bool,
    max_depth: usize,
}

impl Lexer {
    /// Open `path` as the top-level (and only initial) source.
    pub fn open(path: &Path, config: &Config) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut sources = SourceMap::new();
        let id = sources.push(path.display().to_string(), text.clone());
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Lexer {
            stack: vec![Frame {
                source_id: id,
                bytes: text.into_bytes(),
                pos: 0,
                dir,
            }],
            sources,
            diagnostics: Vec::new(),
            debug: false,
            max_depth: config.max_nesting_depth as usize,
        })
    }

    /// Build a lexer directly from in-memory text, labeled `name`, with
    /// no filesystem backing (useful for tests and the `slip check -`
    /// stdin path).
    pub fn from_str(name: impl Into<String>, text: impl Into<String>, config: &Config) -> Self {
        let text = text.into();
        let mut sources = SourceMap::new();
        let id = sources.push(name, text.clone());
        Lexer {
            stack: vec![Frame {
                source_id: id,
                bytes: text.into_bytes(),
                pos: 0,
                dir: PathBuf::from("."),
            }],
            sources,
            diagnostics: Vec::new(),
            debug: false,
            max_depth: config.max_nesting_depth as usize,
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether the base (outermost) source is current — no `#include` is
    /// active (spec §4.5 `isTop()`).
    pub fn is_top(&self) -> bool {
        self.stack.len() == 1
    }

    fn frame(&self) -> &Frame {
        self.stack.last().expect("lexer stack never empty")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("lexer stack never empty")
    }

    fn peek(&self) -> Option<u8> {
        let f = self.frame();
        f.bytes.get(f.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        let f = self.frame();
        f.bytes.get(f.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let f = self.frame_mut();
        let b = f.bytes.get(f.pos).copied();
        if b.is_some() {
            f.pos += 1;
        }
        b
    }

    fn pos(&self) -> u32 {
        self.frame().pos as u32
    }

    fn source_id(&self) -> u16 {
        self.frame().source_id
    }

    /// Push a new source onto the stack for `#include "path"` (spec §4.5
    /// `saveLexState`). `path` resolves relative to the including file's
    /// directory. Returns `false` (and posts a diagnostic) if the file
    /// cannot be opened or the include stack is already at its nesting
    /// cap.
    pub fn save_lex_state(&mut self, path: &str, at: Span) -> bool {
        if self.stack.len() >= self.max_depth {
            self.diagnostics.push(Diagnostic::error(
                Category::Lexical,
                format!("include nesting exceeds {} levels", self.max_depth),
                at,
            ));
            return false;
        }
        let dir = self.frame().dir.clone();
        let full = dir.join(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => {
                let id = self.sources.push(full.display().to_string(), text.clone());
                let child_dir = full.parent().unwrap_or(Path::new(".")).to_path_buf();
                self.stack.push(Frame {
                    source_id: id,
                    bytes: text.into_bytes(),
                    pos: 0,
                    dir: child_dir,
                });
                true
            }
            Err(e) => {
                self.diagnostics.push(Diagnostic::error(
                    Category::Lexical,
                    format!("cannot open include file '{}': {e}", full.display()),
                    at,
                ));
                false
            }
        }
    }

    /// Pop the current source (spec §4.5 `restoreLexState`), returning
    /// `false` if already at the base source.
    pub fn restore_lex_state(&mut self) -> bool {
        if self.is_top() {
            return false;
        }
        self.stack.pop();
        true
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => {
                                self.diagnostics.push(Diagnostic::error(
                                    Category::Lexical,
                                    "unterminated block comment",
                                    Span::new(self.source_id(), self.pos(), self.pos()),
                                ));
                                break;
                            }
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token, popping finished include frames as needed
    /// (EOF on a pushed source resumes the parent — spec §4.5).
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            if self.peek().is_none() {
                if self.is_top() {
                    let id = self.source_id();
                    let p = self.pos();
                    return Token {
                        lexeme: Lexeme::Eof,
                        span: Span::new(id, p, p),
                    };
                }
                self.restore_lex_state();
                continue;
            }
            return self.scan_one();
        }
    }

    fn scan_one(&mut self) -> Token {
        let start = self.pos();
        let id = self.source_id();
        let b = self.peek().unwrap();

        if is_name_start(b) {
            return self.scan_ident_or_keyword(start, id);
        }
        if b.is_ascii_digit() {
            return self.scan_number(start, id);
        }
        match b {
            b'\'' => self.scan_char(start, id),
            b'"' => self.scan_string(start, id),
            b';' => self.single(Lexeme::Semicolon, start, id),
            b'(' => self.single(Lexeme::LParen, start, id),
            b')' => self.single(Lexeme::RParen, start, id),
            b'<' => self.single(Lexeme::Lt, start, id),
            b'>' => self.single(Lexeme::Gt, start, id),
            b'#' => self.single(Lexeme::Hash, start, id),
            b',' => self.single(Lexeme::Comma, start, id),
            b'{' => self.single(Lexeme::LBrace, start, id),
            b'}' => self.single(Lexeme::RBrace, start, id),
            _ => {
                self.bump();
                let span = Span::new(id, start, self.pos());
                self.diagnostics.push(Diagnostic::error(
                    Category::Lexical,
                    format!("unrecognized character '{}'", b as char),
                    span,
                ));
                Token {
                    lexeme: Lexeme::Eof,
                    span,
                }
            }
        }
    }

    fn single(&mut self, lexeme: Lexeme, start: u32, id: u16) -> Token {
        self.bump();
        Token {
            lexeme,
            span: Span::new(id, start, self.pos()),
        }
    }

    fn scan_ident_or_keyword(&mut self, start: u32, id: u16) -> Token {
        let f = self.frame();
        let mut end = f.pos;
        while let Some(b) = f.bytes.get(end).copied() {
            if is_name_continue(b) {
                end += 1;
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&f.bytes[f.pos..end]).into_owned();
        self.frame_mut().pos = end;
        let span = Span::new(id, start, self.pos());
        let lexeme = Lexeme::from_keyword(&text).unwrap_or(Lexeme::Ident(text));
        Token { lexeme, span }
    }

    fn scan_number(&mut self, start: u32, id: u16) -> Token {
        let f = self.frame();
        let mut end = f.pos;
        let bytes = &f.bytes;
        let mut is_float = false;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            is_float = true;
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut look = end + 1;
            if look < bytes.len() && (bytes[look] == b'+' || bytes[look] == b'-') {
                look += 1;
            }
            if look < bytes.len() && bytes[look].is_ascii_digit() {
                is_float = true;
                end = look;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
            }
        }
        let digits = String::from_utf8_lossy(&bytes[f.pos..end]).into_owned();

        // Suffix: UC, C, UL, L (spec §6.1). Longest match first.
        let suffix = {
            let rest = &bytes[end..];
            if rest.starts_with(b"UC") {
                Some(("UC", 2))
            } else if rest.starts_with(b"UL") {
                Some(("UL", 2))
            } else if rest.first() == Some(&b'C') {
                Some(("C", 1))
            } else if rest.first() == Some(&b'L') {
                Some(("L", 1))
            } else {
                None
            }
        };
        let (suffix_str, suffix_len) = suffix.unwrap_or(("", 0));
        let total_end = end + suffix_len;
        self.frame_mut().pos = total_end;
        let span = Span::new(id, start, self.pos());

        if is_float {
            let value: f64 = digits.parse().unwrap_or(0.0);
            return Token {
                lexeme: Lexeme::Float(value),
                span,
            };
        }

        let lexeme = match suffix_str {
            "UC" => Lexeme::UCharLit(digits.parse::<u64>().unwrap_or(0) as u8),
            "C" => Lexeme::CharLit(digits.parse::<i64>().unwrap_or(0) as i8),
            "UL" => Lexeme::UInteger(digits.parse::<u64>().unwrap_or(0)),
            "L" | "" => Lexeme::Integer(digits.parse::<i64>().unwrap_or(0)),
            _ => unreachable!(),
        };
        Token { lexeme, span }
    }

    fn scan_char(&mut self, start: u32, id: u16) -> Token {
        self.bump(); // opening '\''
        let value = match self.bump() {
            Some(b'\\') => self.scan_escape(),
            Some(b) => b,
            None => b'\0',
        };
        if self.peek() == Some(b'\'') {
            self.bump();
        } else {
            self.diagnostics.push(Diagnostic::error(
                Category::Lexical,
                "unterminated char literal",
                Span::new(id, start, self.pos()),
            ));
        }
        let span = Span::new(id, start, self.pos());
        Token {
            lexeme: Lexeme::CharLit(value as i8),
            span,
        }
    }

    fn scan_escape(&mut self) -> u8 {
        match self.bump() {
            Some(b'n') => b'\n',
            Some(b't') => b'\t',
            Some(b'r') => b'\r',
            Some(b'0') => 0,
            Some(b'\\') => b'\\',
            Some(b'\'') => b'\'',
            Some(b'"') => b'"',
            Some(b) => b,
            None => b'\0',
        }
    }

    fn scan_string(&mut self, start: u32, id: u16) -> Token {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    self.diagnostics.push(Diagnostic::error(
                        Category::Lexical,
                        "unterminated string literal",
                        Span::new(id, start, self.pos()),
                    ));
                    break;
                }
                Some(b'"') => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    value.push(self.scan_escape() as char);
                }
                Some(b) => {
                    self.bump();
                    value.push(b as char);
                }
            }
        }
        Token {
            lexeme: Lexeme::Str(value),
            span: Span::new(id, start, self.pos()),
        }
    }
}
