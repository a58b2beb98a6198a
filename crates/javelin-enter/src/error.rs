//! Error types for entry.
//!
//! Structural problems in the source are reported as diagnostics and never
//! surface here. These errors cover the two cases that unwind: a symbol that
//! cannot be completed, and conditions that abort compilation outright.

use crate::symbols::SymbolId;
use std::fmt;

/// A symbol could not be completed (missing or broken class-path entry).
///
/// Caught at the call site, reported, and the dependency treated as an
/// error type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionFailure {
    pub symbol: SymbolId,
    pub name: String,
    pub reason: String,
}

impl CompletionFailure {
    pub fn new(symbol: SymbolId, name: impl Into<String>, reason: impl Into<String>) -> Self {
        CompletionFailure {
            symbol,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CompletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot complete '{}': {}", self.name, self.reason)
    }
}

impl std::error::Error for CompletionFailure {}

/// Compilation cannot continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FatalError {
    pub message: String,
}

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        FatalError {
            message: message.into(),
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FatalError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnterError {
    Completion(CompletionFailure),
    Fatal(FatalError),
}

impl fmt::Display for EnterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnterError::Completion(e) => write!(f, "{e}"),
            EnterError::Fatal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EnterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnterError::Completion(e) => Some(e),
            EnterError::Fatal(e) => Some(e),
        }
    }
}

impl From<CompletionFailure> for EnterError {
    fn from(e: CompletionFailure) -> Self {
        EnterError::Completion(e)
    }
}

impl From<FatalError> for EnterError {
    fn from(e: FatalError) -> Self {
        EnterError::Fatal(e)
    }
}

pub type EnterResult<T> = Result<T, EnterError>;
