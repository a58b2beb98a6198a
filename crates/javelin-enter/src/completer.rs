//! Deferred population of symbols.

use crate::env::Env;
use javelin_ast::{MethodDecl, VarDecl};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// What to run when an incomplete symbol is completed.
///
/// A symbol holds at most one completer. [`crate::Enter::complete`] takes it
/// out of the symbol before dispatching, so each completer runs at most once
/// and reentrant completion of the same symbol is a no-op.
#[derive(Clone)]
pub enum Completer {
    /// Source class: resolve the hierarchy, then queue member entry.
    /// The class environment is looked up in the type-env table.
    Hierarchy,
    /// Field or variable: attribute the declared type and initializer.
    Field { tree: Arc<VarDecl>, env: Rc<Env> },
    /// Method: attribute the signature and body.
    Method { tree: Arc<MethodDecl>, env: Rc<Env> },
    /// Class known only from the class path.
    ClassFile,
    /// Package whose class-path members have not been listed yet.
    Package,
}

impl Completer {
    pub fn name(&self) -> &'static str {
        match self {
            Completer::Hierarchy => "hierarchy",
            Completer::Field { .. } => "field",
            Completer::Method { .. } => "method",
            Completer::ClassFile => "class_file",
            Completer::Package => "package",
        }
    }
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completer::Field { tree, .. } => write!(f, "Field({})", tree.name),
            Completer::Method { tree, .. } => {
                write!(f, "Method({})", tree.name.as_deref().unwrap_or("<error>"))
            }
            other => f.write_str(other.name()),
        }
    }
}
