#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use javelin_cli::CliArgs;
use std::io::IsTerminal;

fn main() -> Result<()> {
    // Installed only when JAVELIN_LOG or RUST_LOG is set.
    javelin_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let color = !args.no_color && std::io::stdout().is_terminal();
    let outcome = javelin_cli::run(&args, color)?;

    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }
    if let Some(fatal) = &outcome.fatal {
        eprintln!("{fatal}");
    }
    std::process::exit(outcome.exit_code());
}
