//! Grammar + semantic actions (spec §4.6, §6.1). A handwritten
//! recursive-descent parser rather than a generated LALR table (spec §9:
//! "the cleanest target-language rendering is a handwritten recursive-
//! descent ... parser whose semantic actions take and return description-
//! packet values explicitly"). Struct shape (`tokens`/lookahead buffer,
//! `diagnostics`, an explicit nesting-depth guard in place of relying on
//! native recursion limits) follows the teacher's `src/parser.rs`.

use std::collections::VecDeque;

use crate::config::Config;
use crate::datum::Datum;
use crate::diagnostic::{Category, Diagnostic};
use crate::hash::Registry;
use crate::lexer::{Lexer, Token};
use crate::list::{Cell, HeaderId, ListStore};
use crate::packet::Packet;
use crate::span::Span;
use crate::token::Lexeme;

pub struct Parser<'a, S: ListStore> {
    lexer: Lexer,
    lookahead: VecDeque<Token>,
    pub registry: &'a mut Registry,
    pub store: &'a mut S,
    pub diagnostics: Vec<Diagnostic>,
    depth: u32,
    max_depth: u32,
}

impl<'a, S: ListStore> Parser<'a, S> {
    pub fn new(lexer: Lexer, registry: &'a mut Registry, store: &'a mut S, config: &Config) -> Self {
        Parser {
            lexer,
            lookahead: VecDeque::new(),
            registry,
            store,
            diagnostics: Vec::new(),
            depth: 0,
            max_depth: config.max_nesting_depth,
        }
    }

    pub fn into_diagnostics(mut self) -> Vec<Diagnostic> {
        self.diagnostics.append(&mut self.lexer.diagnostics);
        self.diagnostics
    }

    pub fn lexer_sources(&self) -> &crate::diagnostic::SourceMap {
        &self.lexer.sources
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            let tok = self.lexer.next_token();
            self.lookahead.push_back(tok);
        }
    }

    fn peek(&mut self) -> &Lexeme {
        self.fill(0);
        &self.lookahead[0].lexeme
    }

    fn peek2(&mut self) -> &Lexeme {
        self.fill(1);
        &self.lookahead[1].lexeme
    }

    fn peek_span(&mut self) -> Span {
        self.fill(0);
        self.lookahead[0].span
    }

    fn bump(&mut self) -> Token {
        self.fill(0);
        self.lookahead.pop_front().unwrap()
    }

    fn is(&mut self, lexeme: &Lexeme) -> bool {
        self.peek() == lexeme
    }

    fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.diagnostics.push(Diagnostic::error(
                Category::Syntactic,
                format!("list nesting exceeds {} levels", self.max_depth),
                self.peek_span(),
            ));
            false
        } else {
            true
        }
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    fn error(&mut self, message: impl Into<String>) {
        let span = self.peek_span();
        self.diagnostics.push(Diagnostic::error(Category::Syntactic, message, span));
    }

    /// Resynchronize to the next `;` (spec §7: "parser resynchronizes to
    /// next `;` where possible").
    fn recover_to_semicolon(&mut self) {
        loop {
            match self.peek() {
                Lexeme::Semicolon => {
                    self.bump();
                    return;
                }
                Lexeme::Eof => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn expect(&mut self, lexeme: Lexeme) -> Result<Token, ()> {
        if *self.peek() == lexeme {
            Ok(self.bump())
        } else {
            let found = self.peek().description();
            self.error(format!("expected {}, found {}", lexeme.description(), found));
            Err(())
        }
    }

    fn expect_ident(&mut self) -> Result<String, ()> {
        match self.peek().clone() {
            Lexeme::Ident(name) => {
                self.bump();
                Ok(name)
            }
            other => {
                self.error(format!("expected a name, found {}", other.description()));
                Err(())
            }
        }
    }

    fn expect_integer(&mut self) -> Result<i64, ()> {
        match self.peek().clone() {
            Lexeme::Integer(n) => {
                self.bump();
                Ok(n)
            }
            Lexeme::UInteger(n) => {
                self.bump();
                Ok(n as i64)
            }
            other => {
                self.error(format!("expected an integer, found {}", other.description()));
                Err(())
            }
        }
    }

    /// `file := declaration* topList?` (spec §6.1). Returns the header of
    /// the top-level list, always valid even after diagnosed errors
    /// (spec §7: "the returned list is always a valid list").
    pub fn parse_file(&mut self) -> HeaderId {
        loop {
            match self.peek() {
                Lexeme::List | Lexeme::User | Lexeme::Hash | Lexeme::Ident(_) => {
                    if self.parse_declaration().is_err() {
                        self.recover_to_semicolon();
                    }
                }
                _ => break,
            }
        }

        let result = match self.peek() {
            Lexeme::LParen => match self.parse_list_def() {
                Ok(packet) => {
                    let header = packet.as_list().expect("list def always yields a list payload");
                    // Nothing downstream pushes this header into a parent
                    // or disposes the packet, so balance the transient
                    // retain `parse_list_def` took ourselves (spec §5: the
                    // caller gets back a header at its true refcount).
                    self.store.release(header);
                    header
                }
                Err(()) => {
                    self.recover_to_semicolon();
                    self.store.create_header()
                }
            },
            Lexeme::LBrace => match self.parse_sublist_reference() {
                Ok(handle) => handle,
                Err(()) => self.store.create_header(),
            },
            Lexeme::Eof => self.store.create_header(),
            other => {
                let desc = other.description();
                self.error(format!("expected a top-level list, found {desc}"));
                self.store.create_header()
            }
        };

        if !self.is(&Lexeme::Eof) {
            self.error("unexpected trailing input after the top-level list");
        }
        result
    }

    fn parse_declaration(&mut self) -> Result<(), ()> {
        match self.peek().clone() {
            Lexeme::List => self.parse_list_decl(),
            Lexeme::User => self.parse_user_decl(),
            Lexeme::Hash => self.parse_include(),
            Lexeme::Ident(_) => self.parse_named_definition(),
            _ => unreachable!("caller only dispatches here on a declaration starter"),
        }
    }

    /// `'list' name (',' name)* ';'`.
    fn parse_list_decl(&mut self) -> Result<(), ()> {
        self.bump();
        loop {
            let name = self.expect_ident()?;
            if self
                .registry
                .declare_name(&name, self.store)
                .is_err()
            {
                self.error(format!("could not declare '{name}': hash table exhausted"));
                return Err(());
            }
            if self.is(&Lexeme::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(Lexeme::Semicolon)?;
        Ok(())
    }

    /// `'user' name (',' name)* ';'`. Purely syntactic: a `user` block
    /// mirrors the writer's own output (spec §6.4) and does not itself
    /// register a parser — that happens out of band, before parsing, via
    /// [`Registry::register_user_data`].
    fn parse_user_decl(&mut self) -> Result<(), ()> {
        self.bump();
        loop {
            self.expect_ident()?;
            if self.is(&Lexeme::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(Lexeme::Semicolon)?;
        Ok(())
    }

    /// `'#' 'include' '"' path '"'`.
    fn parse_include(&mut self) -> Result<(), ()> {
        let hash_span = self.peek_span();
        self.bump();
        self.expect(Lexeme::Include)?;
        let path = match self.peek().clone() {
            Lexeme::Str(s) => {
                self.bump();
                s
            }
            other => {
                self.error(format!("expected an include path, found {}", other.description()));
                return Err(());
            }
        };
        self.lexer.save_lex_state(&path, hash_span);
        Ok(())
    }

    /// `name listDef ';'`. The body is still built into a transient
    /// header, copied into the name's stable registry target, and
    /// discarded exactly as before — but a `<{otherName}>` descriptor
    /// reference inside the body chains directly on that stable target
    /// (spec §4.4), not on the transient header, since the target is the
    /// identity that survives for the forward-reference to find once the
    /// transient body has been copied and reclaimed.
    fn parse_named_definition(&mut self) -> Result<(), ()> {
        let name = self.expect_ident()?;
        let target = self.registry.get_sublist_handle(&name, self.store).map_err(|reason| {
            self.error(reason);
        })?;
        // The registry holds no strong reference of its own to a named
        // header; release the transient hold `get_sublist_handle` handed
        // us immediately, since we're not pushing this reference anywhere.
        self.store.release(target);
        let body = self.parse_list_def_with_descriptor_host(Some(target))?;
        let header = body.as_list().expect("list def always yields a list payload");
        self.expect(Lexeme::Semicolon)?;
        if let Err(reason) = self.registry.register_sublist_definition(&name, header, self.store) {
            self.error(reason);
        }
        Ok(())
    }

    /// `'(' mark? description? listBody? ')'` for an anonymous list: a
    /// fresh transient header is created and retained, balanced later by
    /// whoever consumes the packet (`Packet::push_into`/`dispose`, or the
    /// top-level result in `parse_file`). Its own header also serves as
    /// the descriptor host, since an anonymous list's header is the only
    /// identity it ever has.
    fn parse_list_def(&mut self) -> Result<Packet, ()> {
        self.parse_list_def_with_descriptor_host(None)
    }

    /// Same grammar as [`Self::parse_list_def`], but description items
    /// (specifically `<{name}>` forward references, spec §4.4) bind to
    /// `descriptor_host` instead of the transient body header when given,
    /// so they still resolve correctly after the body is copied into that
    /// host and the transient header is reclaimed.
    fn parse_list_def_with_descriptor_host(&mut self, descriptor_host: Option<HeaderId>) -> Result<Packet, ()> {
        if !self.enter_nesting() {
            return Err(());
        }
        let header = self.store.create_header();
        self.store.retain(header);
        let result = self.parse_list_body(header, descriptor_host.unwrap_or(header));
        self.exit_nesting();
        result?;
        Ok(Packet::anonymous_list(header))
    }

    fn parse_list_body(&mut self, header: HeaderId, descriptor_host: HeaderId) -> Result<(), ()> {
        self.expect(Lexeme::LParen)?;

        if self.is(&Lexeme::LBrace) && matches!(self.peek2(), Lexeme::Integer(_) | Lexeme::UInteger(_)) {
            self.bump();
            let n = self.expect_integer()?;
            self.expect(Lexeme::RBrace)?;
            self.store.set_mark(header, (n as u16) & 0x7FFF);
        }

        if self.is(&Lexeme::Lt) {
            self.parse_description(descriptor_host)?;
        }

        while !self.is(&Lexeme::RParen) && !self.is(&Lexeme::Eof) {
            self.parse_item(header)?;
        }
        self.expect(Lexeme::RParen)?;
        Ok(())
    }

    /// `'<' '>' | '<' mark? descItem+ '>' | '<' '{' name '}' '>'`.
    fn parse_description(&mut self, host: HeaderId) -> Result<(), ()> {
        self.expect(Lexeme::Lt)?;
        if self.is(&Lexeme::Gt) {
            self.bump();
            return Ok(());
        }
        if self.is(&Lexeme::LBrace) && matches!(self.peek2(), Lexeme::Ident(_)) {
            self.bump();
            let name = self.expect_ident()?;
            self.expect(Lexeme::RBrace)?;
            self.expect(Lexeme::Gt)?;
            if let Err(reason) = self.registry.chain_descriptor_reference(&name, host, self.store) {
                self.error(reason);
            }
            return Ok(());
        }

        let desc_header = self.store.descriptor_slot(host);
        if self.is(&Lexeme::LBrace) && matches!(self.peek2(), Lexeme::Integer(_) | Lexeme::UInteger(_)) {
            self.bump();
            let n = self.expect_integer()?;
            self.expect(Lexeme::RBrace)?;
            self.store.set_mark(desc_header, (n as u16) & 0x7FFF);
        }
        loop {
            if self.is(&Lexeme::Gt) {
                break;
            }
            let key = self.parse_datum()?;
            if self.is(&Lexeme::Gt) {
                self.error("descriptor-list entry is missing its value");
                self.store.push(desc_header, Cell::Data(key));
                break;
            }
            let value = self.parse_datum()?;
            self.store.push(desc_header, Cell::Data(key));
            self.store.push(desc_header, Cell::Data(value));
        }
        self.expect(Lexeme::Gt)?;
        Ok(())
    }

    /// `item := datum | '{' name '}' | userCall | listDef`.
    fn parse_item(&mut self, parent: HeaderId) -> Result<(), ()> {
        match self.peek().clone() {
            Lexeme::LBrace => {
                let handle = self.parse_sublist_reference()?;
                self.store.push(parent, Cell::Sublist(handle));
                self.store.release(handle);
                Ok(())
            }
            Lexeme::LParen => {
                let packet = self.parse_list_def()?;
                packet.push_into(parent, self.store);
                Ok(())
            }
            Lexeme::Ident(name) => {
                self.bump();
                let body = self.parse_list_def()?;
                self.parse_user_call(&name, body, parent)
            }
            _ => {
                let datum = self.parse_datum()?;
                self.store.push(parent, Cell::Data(datum));
                Ok(())
            }
        }
    }

    /// `'{' name '}'`, returning a caller-owned reference (spec §4.6:
    /// "registers a Referenced entry ... emits a sublist cell").
    fn parse_sublist_reference(&mut self) -> Result<HeaderId, ()> {
        self.expect(Lexeme::LBrace)?;
        let name = self.expect_ident()?;
        self.expect(Lexeme::RBrace)?;
        self.registry.get_sublist_handle(&name, self.store).map_err(|reason| {
            self.error(reason);
        })
    }

    /// `userCall := name listDef`. `name` has already been consumed by
    /// the caller (`parse_item`'s lookahead already distinguishes it from
    /// a bare datum or `{name}`).
    fn parse_user_call(&mut self, name: &str, body: Packet, parent: HeaderId) -> Result<(), ()> {
        let body_header = body.as_list().expect("listDef always yields a list payload");
        match self.registry.get_parse(name) {
            Some(parser) => {
                let result = parser(self.store.cells(body_header));
                self.store.delete(body_header);
                match result {
                    Ok(datum) => {
                        self.store.push(parent, Cell::Data(datum));
                    }
                    Err(reason) => {
                        self.error(format!("user-data parser for '{name}' failed: {reason}"));
                    }
                }
            }
            None => {
                self.error(format!("'{name}' is not a registered user-data class"));
                self.store.delete(body_header);
            }
        }
        Ok(())
    }

    /// `datum := bool | char | ucharLit | int | uint | long | ulong |
    /// float | string`. `i32`/`u32` have no literal spelling (see
    /// `src/token.rs`'s doc comment and `DESIGN.md`).
    fn parse_datum(&mut self) -> Result<Datum, ()> {
        match self.peek().clone() {
            Lexeme::Bool(b) => {
                self.bump();
                Ok(Datum::Bool(b))
            }
            Lexeme::CharLit(c) => {
                self.bump();
                Ok(Datum::I8(c))
            }
            Lexeme::UCharLit(c) => {
                self.bump();
                Ok(Datum::U8(c))
            }
            Lexeme::Integer(n) => {
                self.bump();
                Ok(Datum::I64(n))
            }
            Lexeme::UInteger(n) => {
                self.bump();
                Ok(Datum::U64(n))
            }
            Lexeme::Float(f) => {
                self.bump();
                Ok(Datum::F64(f))
            }
            Lexeme::Str(s) => {
                self.bump();
                Ok(Datum::Str(s))
            }
            other => {
                self.error(format!("expected a literal value, found {}", other.description()));
                Err(())
            }
        }
    }
}
