//! Collected, non-fatal findings from a read or write pass (spec §7).
//!
//! Lexical/syntactic/semantic problems are reported through `Diagnostic`
//! and do not stop the parse (spec §7: "parsing continues so that multiple
//! diagnostics can be reported in a single pass"). Destructive failures use
//! [`crate::error::SlipError`] instead.

use crate::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Which layer raised the diagnostic, per spec §7's taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Lexical,
    Syntactic,
    Semantic,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(category: Category, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(category: Category, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render to stderr using ariadne, resolving `self.span.source_id`
    /// against `sources` (lexer include stack, §4.5: id 0 is the file
    /// the reader was opened on, higher ids are nested `#include`s).
    pub fn render(&self, sources: &SourceMap) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let (name, text) = sources.get(self.span.source_id);

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, name, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((name, self.span.start as usize..self.span.end as usize))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .eprint((name, Source::from(text)))
            .unwrap();
    }
}

/// Maps a lexer source-id (include-stack position) to the filename and
/// text ariadne needs to render a snippet.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    entries: Vec<(String, String)>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a source, returning the id subsequent spans should use.
    pub fn push(&mut self, name: impl Into<String>, text: impl Into<String>) -> u16 {
        self.entries.push((name.into(), text.into()));
        (self.entries.len() - 1) as u16
    }

    pub fn get(&self, id: u16) -> (&str, &str) {
        let (name, text) = &self.entries[id as usize];
        (name.as_str(), text.as_str())
    }
}

pub fn render_diagnostics(diagnostics: &[Diagnostic], sources: &SourceMap) {
    for diag in diagnostics {
        diag.render(sources);
    }
}
