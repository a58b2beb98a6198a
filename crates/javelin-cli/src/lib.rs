//! Command-line driver for the javelin entry phase.
//!
//! Reads source forests serialized as JSON, enters them against a class
//! path, and prints either the diagnostics or a JSON dump of the populated
//! symbol table.

pub mod args;
pub mod driver;
pub mod reporter;
pub mod tracing_config;

pub use args::{CliArgs, OutputFormat};
pub use driver::{RunOutcome, run};
