//! CLI subcommands (spec §10's ambient-stack section), one file per
//! subcommand dispatched from `main.rs`, following the teacher's
//! `src/cli/mod.rs` + `src/cli/{fmt,check}.rs` layout.

pub mod check;
pub mod fmt;

use std::path::PathBuf;
use std::process;

use slip::Config;

/// `Config::load` on `slip.toml` in the current directory, or the
/// built-in defaults if none exists. Shared by every subcommand so they
/// agree on `max_col`/`max_probes`/etc.
pub fn load_config() -> Config {
    match Config::load(&PathBuf::from("slip.toml")) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            process::exit(1);
        }
    }
}
