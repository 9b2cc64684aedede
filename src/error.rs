//! Fatal, non-recoverable failures (spec §7 "Resource" category), as
//! distinct from the [`crate::diagnostic::Diagnostic`] findings a parse
//! collects and keeps going past.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlipError {
    /// The top-level input (or an `#include`d file) could not be opened.
    #[error("cannot open '{path}': {source}")]
    NotOpenable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry's hash table could not grow to accept an insert, and
    /// a rebuild was already in progress when the failure was detected
    /// (spec §4.1 / §9: the recursion guard tripped).
    #[error("hash table exhausted: {reason}")]
    TableFull { reason: String },

    /// A descriptor-list forward reference chain never terminates because
    /// a named list's descriptor refers to itself (spec §4.4: "not
    /// supported and must be diagnosed at resolution time").
    #[error("descriptor-list cycle on '{name}'")]
    DescriptorCycle { name: String },
}

impl SlipError {
    /// The 0/1/2 process-exit convention spec §7 describes: success,
    /// parse failed, file not openable.
    pub fn exit_code(&self) -> i32 {
        match self {
            SlipError::NotOpenable { .. } => 2,
            SlipError::TableFull { .. } | SlipError::DescriptorCycle { .. } => 1,
        }
    }
}
