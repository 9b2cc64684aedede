//! Tunable constants, loadable from an optional `slip.toml`.
//!
//! Grounded in `core-config` (the `freddiehaddad-oxidized` example repo):
//! a plain `serde`-derived struct deserialized with the `toml` crate,
//! falling back to `Default` when no file is present. The teacher
//! (`trident`) hand-scans its own `trident.toml` line by line
//! (`config/project.rs`); we use the real crates instead (see DESIGN.md).

use std::path::Path;

use serde::Deserialize;

/// Spec §4.1: initial hash table capacity.
pub const DEFAULT_INITIAL_TABLE_SIZE: usize = 1024;
/// Spec §4.1: re-probe count beyond which growth is considered.
pub const DEFAULT_MAX_PROBES: u32 = 10;
/// Spec §4.7: output line width.
pub const DEFAULT_MAX_COL: usize = 120;
/// Spec §4.7: cap on accumulated indent.
pub const DEFAULT_MAX_INDENT: usize = 40;
/// Spec §9: cap on recursion depth converted to explicit stacks; used as
/// a sanity bound on nesting when walking the list graph.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 512;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub initial_table_size: usize,
    pub max_probes: u32,
    pub max_col: usize,
    pub max_indent: usize,
    pub max_nesting_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_table_size: DEFAULT_INITIAL_TABLE_SIZE,
            max_probes: DEFAULT_MAX_PROBES,
            max_col: DEFAULT_MAX_COL,
            max_indent: DEFAULT_MAX_INDENT,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl Config {
    /// Load from a `slip.toml` at `path`, falling back to defaults for
    /// any field it doesn't set. Missing file is not an error — it just
    /// yields `Config::default()`.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        toml::from_str(&text).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.initial_table_size, 1024);
        assert_eq!(cfg.max_probes, 10);
        assert_eq!(cfg.max_col, 120);
        assert_eq!(cfg.max_indent, 40);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load(Path::new("/nonexistent/slip.toml")).unwrap();
        assert_eq!(cfg.max_col, DEFAULT_MAX_COL);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slip.toml");
        std::fs::write(&path, "max_col = 80\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.max_col, 80);
        assert_eq!(cfg.max_probes, DEFAULT_MAX_PROBES);
    }
}
