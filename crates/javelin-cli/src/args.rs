use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the javelin binary.
#[derive(Parser, Debug)]
#[command(
    name = "javelin",
    version,
    about = "Enter the classes and members of parsed source forests"
)]
pub struct CliArgs {
    /// JSON files holding one source unit or an array of source units.
    #[arg(value_name = "FOREST", required = true)]
    pub files: Vec<PathBuf>,

    /// Class-path description (packages and pre-compiled classes) in JSON.
    #[arg(long = "classpath", value_name = "FILE")]
    pub class_path: Vec<PathBuf>,

    /// Source forests whose classes are entered only when referenced.
    #[arg(long = "sourcepath", value_name = "FOREST")]
    pub source_path: Vec<PathBuf>,

    /// Do not provide the built-in bootstrap classes.
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Complete the fields and methods of every source class after entry.
    #[arg(long)]
    pub finish_members: bool,

    /// Lint category to disable, e.g. `deprecation`. May be repeated.
    #[arg(long = "suppress", value_name = "LINT")]
    pub suppress: Vec<String>,

    /// Disable colored diagnostics.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// One line per diagnostic followed by a summary.
    #[default]
    Text,
    /// The symbol table dump, diagnostics included.
    Json,
}
