//! Load inputs, run entry and render the result.

use crate::args::{CliArgs, OutputFormat};
use crate::reporter::Reporter;
use anyhow::{Context, Result, bail};
use javelin_ast::SourceUnit;
use javelin_enter::{ClassPath, ClassPathFile, Enter, EnterOptions, FatalError, Lint, SymbolId};
use serde::Deserialize;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS: i32 = 1;
const EXIT_FATAL: i32 = 2;

/// What a run produced. Diagnostics never abort a run; only fatal errors
/// cut it short, and even then the output is rendered.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: String,
    pub error_count: usize,
    pub warning_count: usize,
    pub fatal: Option<String>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        if self.fatal.is_some() {
            EXIT_FATAL
        } else if self.error_count > 0 {
            EXIT_DIAGNOSTICS
        } else {
            EXIT_SUCCESS
        }
    }
}

/// A forest file holds either a single unit or an array of units.
#[derive(Deserialize)]
#[serde(untagged)]
enum Forest {
    Units(Vec<SourceUnit>),
    Unit(SourceUnit),
}

pub fn load_forest(path: &Path) -> Result<Vec<Arc<SourceUnit>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let forest: Forest = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse source forest {}", path.display()))?;
    Ok(match forest {
        Forest::Units(units) => units.into_iter().map(Arc::new).collect(),
        Forest::Unit(unit) => vec![Arc::new(unit)],
    })
}

pub fn load_class_path(args: &CliArgs) -> Result<ClassPath> {
    let mut class_path = if args.no_bootstrap {
        ClassPath::new()
    } else {
        ClassPath::with_bootstrap()
    };
    for path in &args.class_path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: ClassPathFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse class path {}", path.display()))?;
        debug!(path = %path.display(), classes = file.classes.len(), "class path loaded");
        class_path.extend(file);
    }
    for path in &args.source_path {
        for unit in load_forest(path)? {
            class_path.add_source(unit);
        }
    }
    Ok(class_path)
}

fn options(args: &CliArgs) -> Result<EnterOptions> {
    if let Some(name) = args.suppress.iter().find(|n| Lint::from_lint_name(n).is_none()) {
        bail!("unknown lint category '{name}'");
    }
    Ok(EnterOptions {
        lint: Lint::default().suppress(args.suppress.as_slice()),
        ..EnterOptions::default()
    })
}

/// Complete every field and method of every source class.
fn finish_members(enter: &mut Enter) -> Result<(), FatalError> {
    let classes: Vec<SymbolId> = enter
        .symtab()
        .compiled_classes()
        .into_iter()
        .map(|(_, sym)| sym)
        .collect();
    for class in classes {
        enter.complete_members(class)?;
    }
    Ok(())
}

pub fn run(args: &CliArgs, color: bool) -> Result<RunOutcome> {
    let options = options(args)?;
    let class_path = load_class_path(args)?;
    let mut units = Vec::new();
    for path in &args.files {
        units.extend(load_forest(path)?);
    }
    info!(units = units.len(), "entering source forest");

    let mut enter = Enter::with_options(options, Rc::new(class_path));
    let mut result = enter.enter_all(&units);
    if result.is_ok() && args.finish_members {
        result = finish_members(&mut enter);
    }
    let fatal = result.err().map(|e| e.to_string());

    let diagnostics = enter.diagnostics();
    let (error_count, warning_count) = (diagnostics.error_count(), diagnostics.warning_count());
    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&enter.dump())
            .context("failed to serialize the symbol table")?,
        OutputFormat::Text => {
            let reporter = Reporter::new(color);
            let mut out = reporter.render(diagnostics.diagnostics());
            let summary = reporter.summary(error_count, warning_count);
            if !summary.is_empty() {
                if !out.is_empty() {
                    out.push_str("\n\n");
                }
                out.push_str(&summary);
            }
            out
        }
    };

    Ok(RunOutcome {
        output,
        error_count,
        warning_count,
        fatal,
    })
}
