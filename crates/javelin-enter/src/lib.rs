//! Class and member entry for the javelin front end.
//!
//! Entry walks a parsed source forest and populates the symbol table before
//! attribution runs. It happens in two phases:
//!
//! 1. **Class entry** registers a stub symbol for every class, links it into
//!    its package or enclosing class, records the class environment and
//!    queues the class for completion.
//! 2. **Member entry** runs when a class is completed: imports of its unit
//!    are processed, the supertype list is resolved and checked for cycles,
//!    and finally fields and methods are entered.
//!
//! Completion is lazy and reentrant. Every unfinished symbol carries a
//! [`Completer`]; [`Enter::complete`] detaches it before running, so a
//! completion that circles back to the same symbol is a no-op.
//!
//! ```ignore
//! let mut enter = Enter::new(Rc::new(ClassPath::with_bootstrap()));
//! enter.enter_all(&units)?;
//! for diag in enter.diagnostics().iter() {
//!     println!("{diag}");
//! }
//! ```

pub mod annotate;
pub mod attribution;
pub mod class_finder;
pub mod completer;
pub mod dump;
pub mod env;
pub mod error;
pub mod options;
pub mod scopes;
pub mod symbols;
pub mod symtab;

mod state;
mod state_checks;
mod state_class_enter;
mod state_imports;
mod state_lookup;
mod state_member_enter;

pub use annotate::Annotate;
pub use attribution::{Attr, Attribution};
pub use class_finder::{ClassFinder, ClassPath, ClassPathFile, ClassStub, MemberStub};
pub use completer::Completer;
pub use dump::{ClassDump, MemberDump, SymbolTableDump};
pub use env::{Env, EnvInfo, EnvTree};
pub use error::{CompletionFailure, EnterError, EnterResult, FatalError};
pub use options::{EnterOptions, Lint};
pub use scopes::{Scope, ScopeArena, ScopeId, ScopeKind};
pub use state::{Enter, UnitId, UnitState};
pub use state_checks::DeclContext;
pub use symbols::{ClassInfo, ClassState, Symbol, SymbolArena, SymbolId, SymbolKind, Type, symbol_flags};
pub use symtab::SymbolTable;
