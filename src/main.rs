mod cli;

use clap::{Parser, Subcommand};

use cli::check::CheckArgs;
use cli::fmt::FmtArgs;

#[derive(Parser)]
#[command(name = "slip", version, about = "Symbolic list structures: textual reader and writer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a `.slip` file and report diagnostics without writing anything
    Check(CheckArgs),
    /// Parse a `.slip` file and re-emit it in canonical form
    Fmt(FmtArgs),
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Fmt(args) => cli::fmt::cmd_fmt(args),
    }
}
