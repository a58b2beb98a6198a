//! Common types and utilities for the javelin compiler front end.
//!
//! This crate provides foundational types used across all javelin crates:
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, `DiagnosticBag`, codes and message templates)
//! - Compiler limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostic collection and message lookup
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticBag, DiagnosticSeverity, diagnostic_codes, format_message,
    get_message_template,
};

// Centralized limits and thresholds
pub mod limits;
