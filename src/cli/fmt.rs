use std::path::PathBuf;
use std::process;

use clap::Args;

use slip::{render_diagnostics, write_to_string, Arena, Reader};

#[derive(Args)]
pub struct FmtArgs {
    /// Input `.slip` file
    pub input: PathBuf,
    /// Write the canonical form back to `input` instead of stdout
    #[arg(long)]
    pub write: bool,
}

pub fn cmd_fmt(args: FmtArgs) {
    let FmtArgs { input, write } = args;
    let config = super::load_config();
    let mut reader = Reader::new(config);
    let mut arena = Arena::new();

    let outcome = match reader.read_file(&input, &mut arena) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(err.exit_code());
        }
    };

    render_diagnostics(&outcome.diagnostics, &outcome.sources);
    if outcome.has_errors() {
        process::exit(1);
    }

    let text = write_to_string(&arena, outcome.top, config);
    if write {
        if let Err(e) = std::fs::write(&input, &text) {
            eprintln!("error: cannot write '{}': {e}", input.display());
            process::exit(1);
        }
        eprintln!("Formatted: {}", input.display());
    } else {
        print!("{text}");
    }
}
