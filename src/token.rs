//! The token alphabet the lexer produces and the parser consumes (spec
//! §6.3). Several legacy terminal names in the grammar this was distilled
//! from (`CHAR`/`CHARS` and `UCHAR`/`CHARU`) are two lexical spellings of
//! the same semantic literal — a quoted `'c'` and a `C`-suffixed digit
//! string both denote a signed byte, so both collapse onto one token
//! here (`CharLit`), and likewise for the unsigned-byte pair. See
//! `SPEC_FULL.md` §11 and `DESIGN.md` for the reasoning.

#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Keywords
    List,
    User,
    Include,

    // Literals
    Bool(bool),
    /// `'c'` or a `C`-suffixed digit string: signed 8-bit.
    CharLit(i8),
    /// A `UC`-suffixed digit string: unsigned 8-bit.
    UCharLit(u8),
    /// Unsuffixed or `L`-suffixed digit string: signed 64-bit.
    Integer(i64),
    /// A `UL`-suffixed digit string: unsigned 64-bit.
    UInteger(u64),
    Float(f64),
    Str(String),
    Ident(String),

    // Symbols
    Semicolon, // ';'  (a.k.a. END)
    LParen,    // '('
    RParen,    // ')'
    Lt,        // '<'
    Gt,        // '>'
    Hash,      // '#'
    Comma,     // ','
    LBrace,    // '{'
    RBrace,    // '}'

    Eof,
}

impl Lexeme {
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        match s {
            "list" => Some(Lexeme::List),
            "user" => Some(Lexeme::User),
            "include" => Some(Lexeme::Include),
            "true" => Some(Lexeme::Bool(true)),
            "false" => Some(Lexeme::Bool(false)),
            _ => None,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Lexeme::List => "'list'".into(),
            Lexeme::User => "'user'".into(),
            Lexeme::Include => "'include'".into(),
            Lexeme::Bool(_) => "boolean literal".into(),
            Lexeme::CharLit(_) => "char literal".into(),
            Lexeme::UCharLit(_) => "unsigned char literal".into(),
            Lexeme::Integer(_) => "integer literal".into(),
            Lexeme::UInteger(_) => "unsigned integer literal".into(),
            Lexeme::Float(_) => "float literal".into(),
            Lexeme::Str(_) => "string literal".into(),
            Lexeme::Ident(_) => "identifier".into(),
            Lexeme::Semicolon => "';'".into(),
            Lexeme::LParen => "'('".into(),
            Lexeme::RParen => "')'".into(),
            Lexeme::Lt => "'<'".into(),
            Lexeme::Gt => "'>'".into(),
            Lexeme::Hash => "'#'".into(),
            Lexeme::Comma => "','".into(),
            Lexeme::LBrace => "'{'".into(),
            Lexeme::RBrace => "'}'".into(),
            Lexeme::Eof => "end of input".into(),
        }
    }
}

/// A name as matched by `[A-Za-z_$][A-Za-z0-9_$]*` (spec §6.1).
pub fn is_name_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$'
}

pub fn is_name_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}
