use std::path::PathBuf;
use std::process;

use clap::Args;

use slip::{render_diagnostics, Arena, Reader};

#[derive(Args)]
pub struct CheckArgs {
    /// Input `.slip` file
    pub input: PathBuf,
    /// Also warn about named lists that are defined but never referenced
    #[arg(long)]
    pub warn_unused: bool,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs { input, warn_unused } = args;
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

    for name in reader.unresolved_names() {
        eprintln!("warning: '{name}' referenced but never defined");
    }
    if warn_unused {
        for name in reader.unused_names() {
            eprintln!("warning: '{name}' defined but never used");
        }
    }

    if outcome.has_errors() {
        eprintln!("error: {}", input.display());
        process::exit(1);
    }
    eprintln!("OK: {}", input.display());
}
