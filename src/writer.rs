//! Writer (spec §4.7, §6.4): a two-pass serializer that walks a list graph,
//! names every shared or multiply-referenced sublist, and emits declarations
//! followed by the top-level list through a line-fitting outputter.
//!
//! Pass 1/pass 2 split, the `registerSublist`/`renameListNames` naming
//! scheme, and the `fitOutput` character-class state machine are grounded on
//! `original_source/src/libgslip/SlipWrite.cc`, since spec §4.7 describes the
//! shape of the algorithm but not every ordering detail. The line-fitting
//! buffer (`line`/`col`/`indent` fields) follows the same source; the rest of
//! the crate's structuring (owning a private `Registry`, building a `String`
//! rather than writing to an `io::Write` directly so tests can assert on the
//! exact text) follows this crate's own `Reader` shape in `lib.rs`.

use crate::config::Config;
use crate::datum::{Datum, UserData};
use crate::hash::Registry;
use crate::list::{Cell, HeaderId, ListStore};

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Ignore,
    Quote,
    Char,
    Escape,
    Space,
}

fn classify(b: u8) -> CharClass {
    match b {
        b' ' => CharClass::Space,
        b'"' => CharClass::Quote,
        b'\'' => CharClass::Char,
        b'\\' => CharClass::Escape,
        _ => CharClass::Ignore,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Bare,
    InString,
    InChar,
}

/// spec §4.7's "tiny state machine classif[ying] characters ... tracks
/// whether we're inside a `"…"` or `'…'`". A quote only flips state when
/// we're not already inside the *other* kind of quote.
fn step(state: QuoteState, class: CharClass) -> QuoteState {
    use QuoteState::*;
    match (state, class) {
        (Bare, CharClass::Quote) => InString,
        (InString, CharClass::Quote) => Bare,
        (Bare, CharClass::Char) => InChar,
        (InChar, CharClass::Char) => Bare,
        (s, _) => s,
    }
}

/// Two-pass list-graph serializer (spec §4.7). Owns its own [`Registry`],
/// used purely as output-side bookkeeping (spec §5: "a writer owns: one
/// registry, one output sink, one line buffer") — entirely separate from
/// whatever registry a reader used to build the graph being written.
pub struct Writer<'a, S: ListStore> {
    store: &'a S,
    registry: Registry,
    config: Config,
    list_no: u32,
    user_entries: usize,
    name_size: usize,
    out: String,
    line: String,
    col: usize,
    indent: usize,
}

impl<'a, S: ListStore> Writer<'a, S> {
    pub fn new(store: &'a S, config: Config) -> Self {
        Writer {
            store,
            registry: Registry::new(config.initial_table_size, config.max_probes),
            config,
            list_no: 0,
            user_entries: 0,
            name_size: 0,
            out: String::new(),
            line: String::new(),
            col: 0,
            indent: 0,
        }
    }

    /// Serialize `top` to SLIP text (spec §6.4's layout: user declaration,
    /// then list declarations, then the top-level list).
    pub fn write(mut self, top: HeaderId) -> String {
        self.pass1(top);
        self.registry.renumber_output_lists();
        self.write_user_declaration();
        self.write_list_declarations();

        self.line.clear();
        self.col = 0;
        self.indent = 0;
        match self.registry.get_sublist_name(top).map(str::to_string) {
            Some(name) => self.output(&format!("{{{name}}}")),
            None => {
                self.output("(");
                self.write_list_body(top);
                self.output(")");
            }
        }
        self.flush_line();
        self.out
    }

    /// Pass 1 (spec §4.7): discover every sublist worth naming, and every
    /// distinct user-data class, via a depth-first walk. A header already
    /// registered stops the recursion — this is what keeps a cyclic or
    /// repeatedly-shared graph finite.
    fn pass1(&mut self, head: HeaderId) {
        let descriptor = self.store.descriptor(head);
        if let Some(d) = descriptor {
            self.pass1(d);
        } else if self.store.is_empty(head) && self.store.mark(head) == 0 && self.store.refcount(head) == 0 {
            return;
        }

        if self.registry.get_sublist_name(head).is_some() {
            return;
        }
        self.list_no += 1;
        if self
            .registry
            .register_output_list(head, format!("list{}", self.list_no))
            .is_err()
        {
            return;
        }

        for cell in self.store.cells(head) {
            match cell {
                Cell::Sublist(child) => self.pass1(*child),
                Cell::Data(datum) => {
                    if let Some(class_name) = datum.class_name() {
                        if self.registry.note_user_data_class(class_name) {
                            self.user_entries += 1;
                            self.name_size = self.name_size.max(class_name.len());
                        }
                    }
                }
            }
        }
    }

    /// `user name1, name2, …;` wrapped every `entriesPerLine` names, where
    /// `entriesPerLine = ((MAXCOL-5)+nameSize)/(nameSize+1)` for the widest
    /// class name seen (`writeUserDeclaration` in `SlipWrite.cc`).
    fn write_user_declaration(&mut self) {
        if self.user_entries == 0 {
            return;
        }
        let names: Vec<String> = self
            .registry
            .user_data_classes()
            .map(|e| e.name.clone().expect("user-data entry always has a name"))
            .collect();

        let name_size = self.name_size.max(1);
        let entries_per_line = ((self.config.max_col.saturating_sub(5) + name_size) / (name_size + 1)).max(1);

        self.out.push_str("user");
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            if i > 0 && i % entries_per_line == 0 {
                self.out.push_str("\n    ");
            } else {
                self.out.push(' ');
            }
            self.out.push_str(name);
        }
        self.out.push_str(";\n");
    }

    /// `listK ( …body… );` for every registered sublist, in `list1..listK`
    /// order, indented under a leading column of `5 + len("listK") + 1`
    /// (spec §4.7).
    fn write_list_declarations(&mut self) {
        let entries: Vec<(HeaderId, String)> = self
            .registry
            .binary_entries()
            .map(|e| {
                (
                    e.handle.expect("binary entry always has a handle"),
                    e.output_name.clone().expect("renumbered before this pass"),
                )
            })
            .collect();
        if entries.is_empty() {
            return;
        }
        let max_name_len = entries.iter().map(|(_, n)| n.len()).max().unwrap_or(0);
        self.indent = 5 + max_name_len + 1;

        for (handle, name) in entries {
            self.line = name;
            self.col = self.line.len();
            self.output("(");
            self.write_list_body(handle);
            self.output(");");
            self.flush_line();
        }
    }

    /// `writeList` (spec §4.7): mark, descriptor (if attached), then cells
    /// in order — sublists as `{listK}` or inline `()`, datums as literals.
    fn write_list_body(&mut self, header: HeaderId) {
        let mark = self.store.mark(header);
        if mark != 0 {
            self.output(&format!("{{0x{mark:02x}}}"));
        }
        if let Some(d) = self.store.descriptor(header) {
            self.write_description_list(d);
        }
        for cell in self.store.cells(header) {
            match cell {
                Cell::Data(datum) => self.write_datum(datum),
                Cell::Sublist(child) => self.write_sublist_cell(*child),
            }
        }
    }

    fn write_sublist_cell(&mut self, child: HeaderId) {
        match self.registry.get_sublist_name(child).map(str::to_string) {
            Some(name) => self.output(&format!("{{{name}}}")),
            None => {
                self.output("(");
                self.write_list_body(child);
                self.output(")");
            }
        }
    }

    /// `'<' … '>'` (spec §4.7 `writeDescriptionList`): `{name}` if the
    /// descriptor list was itself registered (i.e. is shared elsewhere),
    /// otherwise its body inline.
    fn write_description_list(&mut self, header: HeaderId) {
        self.output("<");
        match self.registry.get_sublist_name(header).map(str::to_string) {
            Some(name) => self.output(&format!("{{{name}}}")),
            None => self.write_list_body(header),
        }
        self.output(">");
    }

    fn write_datum(&mut self, datum: &Datum) {
        match datum {
            Datum::UserData(u) => self.write_user_data(u),
            other => {
                let literal = format_literal(other);
                self.output(&literal);
            }
        }
    }

    /// `name(ooo)` (spec §4.6 `userCall`). The payload is the pre-rendered
    /// textual body the registered parser's caller is responsible for
    /// keeping (spec §3: the core "never interprets" the payload, "only
    /// carries it through") — the writer re-emits it verbatim rather than
    /// re-deriving it, since the original cell list was consumed when the
    /// datum was parsed (spec §4.6: the parser's result "replaces the
    /// whole node").
    fn write_user_data(&mut self, u: &UserData) {
        self.output(&u.class_name);
        if u.payload.is_empty() {
            self.output("()");
        } else {
            self.output(&format!("({})", String::from_utf8_lossy(&u.payload)));
        }
    }

    /// `output` (spec §4.7): append `token`, flushing and re-indenting when
    /// it would not fit on the current line. The very first token placed
    /// on an otherwise-empty line gets no leading space; every token after
    /// it is separated from its predecessor by one.
    fn output(&mut self, token: &str) {
        if self.line.is_empty() {
            if token.len() <= self.config.max_col.saturating_sub(self.col) {
                self.col += token.len();
                self.line.push_str(token);
                return;
            }
            self.fit_output(token);
            return;
        }

        let remaining = self.config.max_col.saturating_sub(self.col);
        if token.len() < remaining {
            self.col += 1 + token.len();
            self.line.push(' ');
            self.line.push_str(token);
            return;
        }

        self.flush_line();
        self.col = self.indent.min(self.config.max_indent);
        self.line = " ".repeat(self.col);
        let line_size = self.config.max_col.saturating_sub(self.col);
        if token.len() <= line_size {
            self.col += token.len();
            self.line.push_str(token);
        } else if token.len() <= self.config.max_col {
            self.out.push_str(token);
            self.out.push('\n');
        } else {
            self.fit_output(token);
        }
    }

    fn flush_line(&mut self) {
        self.out.push_str(&self.line);
        self.out.push('\n');
        self.line.clear();
    }

    /// `fitOutput` (spec §4.7): `token` is longer than a full line. Break it
    /// at the last top-level space seen within the available width; if no
    /// such space exists, emit the whole remaining token on its own line.
    fn fit_output(&mut self, token: &str) {
        let bytes = token.as_bytes();
        let line_size = self
            .config
            .max_col
            .saturating_sub(self.indent.min(self.config.max_indent))
            .max(1);
        let mut pos = 0usize;
        while pos < bytes.len() {
            let remaining = bytes.len() - pos;
            let window = remaining.min(line_size);
            let mut state = QuoteState::Bare;
            let mut last_space = None;
            let mut i = 0usize;
            while i < window {
                let class = classify(bytes[pos + i]);
                state = step(state, class);
                if class == CharClass::Escape {
                    i += 1;
                } else if class == CharClass::Space && state == QuoteState::Bare {
                    last_space = Some(i);
                }
                i += 1;
            }
            let take = if remaining <= window {
                remaining
            } else {
                last_space.map(|s| s + 1).unwrap_or(remaining.min(window))
            };
            self.out.push_str(&token[pos..pos + take]);
            self.out.push('\n');
            pos += take;
        }
    }
}

/// `datum := bool | char | ucharLit | int | uint | long | ulong | float |
/// string` (spec §6.1), rendered back to its literal spelling. `I32`/`U32`
/// have no literal suffix in the grammar (see `token.rs`'s doc comment) and
/// are emitted unsuffixed, re-parsing as `I64`/`U64` on a round trip — those
/// variants only arise from direct [`ListStore`] construction, never from
/// parsed text, so this asymmetry never affects `parse(write(L))` for an `L`
/// that came from a parse. Likewise the grammar's token alphabet (spec
/// §6.3) has no minus-sign terminal, so a negative `I64`/`I8` cannot
/// round-trip through text either; this is a property of the grammar, not
/// something the writer works around.
fn format_literal(datum: &Datum) -> String {
    match datum {
        Datum::Bool(b) => b.to_string(),
        Datum::I8(n) => format!("{n}C"),
        Datum::U8(n) => format!("{n}UC"),
        Datum::I32(n) => n.to_string(),
        Datum::U32(n) => n.to_string(),
        Datum::I64(n) => n.to_string(),
        Datum::U64(n) => format!("{n}UL"),
        Datum::F64(f) => format_float(*f),
        Datum::Str(s) => format!("\"{}\"", escape_string(s)),
        Datum::UserData(_) => unreachable!("write_datum handles UserData separately"),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::Arena;

    fn write(store: &Arena, top: HeaderId) -> String {
        Writer::new(store, Config::default()).write(top)
    }

    /// Every non-trivial list the writer touches gets hoisted into its own
    /// `nameK ( ... );` declaration (spec §4.7's `pass1`/`registerSublist`
    /// has no special case for "only used once") — the root is no
    /// exception, so a single flat list still ends up as one declaration
    /// plus a one-line `{name}` reference, not inlined at the top.
    #[test]
    fn flat_integer_list_is_hoisted_into_a_declaration() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        arena.push(h, Cell::Data(Datum::I64(1)));
        arena.push(h, Cell::Data(Datum::I64(2)));
        arena.push(h, Cell::Data(Datum::I64(3)));
        assert_eq!(write(&arena, h), "list1 ( 1 2 3 );\n{list1}\n");
    }

    /// Two registrations land in whatever order the hash table's slots
    /// happen to yield (spec §4.7: renumbering is "a post-pass ... not a
    /// resort"), so this asserts the structural relationship rather than a
    /// specific `list1`/`list2` assignment.
    #[test]
    fn shared_sublist_emits_one_definition_two_references() {
        let mut arena = Arena::new();
        let inner = arena.create_header();
        arena.retain(inner);
        arena.push(inner, Cell::Data(Datum::I64(1)));
        arena.push(inner, Cell::Data(Datum::I64(2)));

        let outer = arena.create_header();
        arena.push(outer, Cell::Sublist(inner));
        arena.push(outer, Cell::Sublist(inner));

        let text = write(&arena, outer);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "two declarations plus one top reference: {text:?}");

        let outer_line = lines[..2]
            .iter()
            .find(|l| l.contains("} {"))
            .expect("one declaration references the same name twice");
        let inner_line = lines[..2].iter().find(|l| *l != outer_line).unwrap();
        assert!(inner_line.ends_with("( 1 2 );"));

        let inner_name = inner_line.split_whitespace().next().unwrap();
        let outer_name = outer_line.split_whitespace().next().unwrap();
        assert_eq!(
            *outer_line,
            format!("{outer_name} ( {{{inner_name}}} {{{inner_name}}} );")
        );
        assert_eq!(lines[2], format!("{{{outer_name}}}"));
    }

    /// A list with nothing but a mark is still non-trivial enough to be
    /// hoisted (the skip condition in `pass1` requires empty *and*
    /// mark-zero *and* refcount-zero).
    #[test]
    fn marked_empty_list_is_hoisted() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        arena.set_mark(h, 0x2A);
        assert_eq!(write(&arena, h), "list1 ( {0x2a} );\n{list1}\n");
    }

    /// The one case `pass1` actually skips: empty, unmarked, unreferenced.
    #[test]
    fn trivial_empty_list_stays_inline() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        assert_eq!(write(&arena, h), "( )\n");
    }

    /// A self-referential list (`{name}` pointing back at its own
    /// declaration) must not recurse forever: the second visit during
    /// `pass1` sees the name already registered and stops.
    #[test]
    fn self_referential_list_terminates_and_round_trips() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        arena.push(h, Cell::Sublist(h));
        assert_eq!(write(&arena, h), "list1 ( {list1} );\n{list1}\n");
    }

    /// A descriptor list is itself non-trivial (two data cells) so it gets
    /// its own declaration too; the host then references it as `<{name}>`
    /// rather than inlining its body. Order between the two declarations
    /// is hash-dependent, so this checks the relationship, not an exact
    /// name.
    #[test]
    fn descriptor_list_is_hoisted_and_referenced_by_name() {
        let mut arena = Arena::new();
        let host = arena.create_header();
        let desc = arena.descriptor_slot(host);
        arena.push(desc, Cell::Data(Datum::I64(3)));
        arena.push(desc, Cell::Data(Datum::I64(4)));
        arena.push(host, Cell::Data(Datum::I64(1)));

        let text = write(&arena, host);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let host_line = lines[..2]
            .iter()
            .find(|l| l.contains("< {"))
            .expect("host's declaration references its descriptor by name");
        let desc_line = lines[..2].iter().find(|l| *l != host_line).unwrap();

        let desc_name = desc_line.split_whitespace().next().unwrap();
        let host_name = host_line.split_whitespace().next().unwrap();
        assert_eq!(*desc_line, format!("{desc_name} ( 3 4 );"));
        assert_eq!(*host_line, format!("{host_name} ( < {{{desc_name}}} > 1 );"));
        assert_eq!(lines[2], format!("{{{host_name}}}"));
    }

    #[test]
    fn string_literal_is_quoted() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        arena.push(h, Cell::Data(Datum::Str("hello".into())));
        assert_eq!(write(&arena, h), "list1 ( \"hello\" );\n{list1}\n");
    }

    #[test]
    fn escape_string_escapes_quotes_and_backslashes() {
        assert_eq!(escape_string("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape_string("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn byte_literals_carry_their_suffix() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        arena.push(h, Cell::Data(Datum::I8(5)));
        arena.push(h, Cell::Data(Datum::U8(6)));
        arena.push(h, Cell::Data(Datum::U64(7)));
        assert_eq!(write(&arena, h), "list1 ( 5C 6UC 7UL );\n{list1}\n");
    }

    #[test]
    fn user_data_writes_class_name_and_payload() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        arena.push(
            h,
            Cell::Data(Datum::UserData(UserData {
                class_name: "COORD".to_string(),
                payload: b"1 2".to_vec(),
            })),
        );
        assert_eq!(
            write(&arena, h),
            "user COORD;\nlist1 ( COORD (1 2) );\n{list1}\n"
        );
    }

    #[test]
    fn long_list_wraps_within_the_configured_width() {
        let mut arena = Arena::new();
        let h = arena.create_header();
        for i in 0..20 {
            arena.push(h, Cell::Data(Datum::I64(i)));
        }
        let config = Config {
            max_col: 20,
            ..Config::default()
        };
        let text = Writer::new(&arena, config).write(h);
        assert!(text.lines().count() > 2, "expected at least one wrapped line: {text:?}");
        assert!(text.lines().all(|l| l.len() <= 20 || !l.contains(' ')));
    }
}
