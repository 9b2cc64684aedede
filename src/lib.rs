//! Symbolic list structures and their textual serialization (spec
//! [`SPEC_FULL.md`]'s system overview): a hash-table-backed registry, a
//! hand-written lexer/parser for the grammar of §6.1/§6.3, and a two-pass
//! writer. Crate layout follows the teacher's root-level module list
//! (see `DESIGN.md`): one file per subsystem, `lib.rs` wiring them
//! together behind a small façade (`Reader`, `write_to_string`) rather
//! than exposing the subsystems only as loose modules.

pub mod config;
pub mod datum;
pub mod diagnostic;
pub mod error;
pub mod hash;
pub mod lexer;
pub mod list;
pub mod packet;
pub mod parser;
pub mod span;
pub mod token;
pub mod writer;

pub use config::Config;
pub use datum::{Datum, UserData};
pub use diagnostic::{render_diagnostics, Category, Diagnostic, Severity, SourceMap};
pub use error::SlipError;
pub use hash::entry::ParseFn;
pub use hash::Registry;
pub use lexer::Lexer;
pub use list::{Arena, Cell, HeaderId, ListStore, Mark};
pub use packet::Packet;
pub use parser::Parser;
pub use span::{Span, Spanned};
pub use writer::Writer;

use std::path::Path;

/// The result of reading one top-level source (and any `#include`s it
/// pulled in): the parsed list, every diagnostic collected along the way,
/// and the source text needed to render them (spec §7).
pub struct ReadOutcome {
    pub top: HeaderId,
    pub diagnostics: Vec<Diagnostic>,
    pub sources: SourceMap,
}

impl ReadOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn render(&self) {
        render_diagnostics(&self.diagnostics, &self.sources);
    }
}

/// Owns one [`Registry`] across however many files get read through it,
/// so named lists and registered user-data classes declared in one file
/// stay visible to the next (spec §4.3's registry is scoped to a reading
/// session, not a single file). The list primitives themselves live in
/// whatever [`ListStore`] the caller supplies — a `Reader` doesn't own an
/// `Arena` itself, matching `Parser`'s own `store: &mut S` split.
pub struct Reader {
    registry: Registry,
    config: Config,
}

impl Reader {
    pub fn new(config: Config) -> Self {
        Reader {
            registry: Registry::new(config.initial_table_size, config.max_probes),
            config,
        }
    }

    /// Register an application-supplied parser for a `ClassName( ... )`
    /// user-data call (spec §4.3, §4.6). Must happen before the file that
    /// uses it is read.
    pub fn register_user_data(&mut self, class_name: &str, parser: ParseFn) -> Result<(), &'static str> {
        self.registry.register_user_data(class_name, parser)
    }

    /// Read and parse `path` (spec §7: a file that can't be opened is a
    /// fatal [`SlipError`], not a diagnostic).
    pub fn read_file(&mut self, path: &Path, store: &mut impl ListStore) -> Result<ReadOutcome, SlipError> {
        let lexer = Lexer::open(path, &self.config).map_err(|source| SlipError::NotOpenable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse(lexer, store))
    }

    /// Read and parse in-memory text labeled `name` (no filesystem access,
    /// so there's no `NotOpenable` path here).
    pub fn read_str(&mut self, name: impl Into<String>, text: impl Into<String>, store: &mut impl ListStore) -> ReadOutcome {
        let lexer = Lexer::from_str(name, text, &self.config);
        self.parse(lexer, store)
    }

    fn parse(&mut self, lexer: Lexer, store: &mut impl ListStore) -> ReadOutcome {
        let mut parser = Parser::new(lexer, &mut self.registry, store, &self.config);
        let top = parser.parse_file();
        let sources = parser.lexer_sources().clone();
        let diagnostics = parser.into_diagnostics();
        ReadOutcome { top, diagnostics, sources }
    }

    /// Names declared (via `list name;` or a forward `{name}`/descriptor
    /// reference) but never given a body by end of the read (spec §7).
    pub fn unresolved_names(&self) -> Vec<String> {
        self.registry.unresolved_names()
    }

    /// Names defined but never referenced (spec §7, a warning not an
    /// error).
    pub fn unused_names(&self) -> Vec<String> {
        self.registry.unused_names()
    }
}

/// Serialize `top` to SLIP text (spec §4.7, §6.4). A fresh [`Writer`]
/// (and its own output-side [`Registry`]) is built per call — write-side
/// naming is independent of whatever names a `Reader` used to build the
/// graph.
pub fn write_to_string<S: ListStore>(store: &S, top: HeaderId, config: Config) -> String {
    Writer::new(store, config).write(top)
}
