//! Diagnostic Infrastructure
//!
//! This module provides infrastructure for collecting compilation errors and
//! warnings produced while entering classes and members. Diagnostics carry a
//! numeric code and a message built from a `{0}`-style template.
//!
//! # Components
//!
//! - `Diagnostic` - A single diagnostic message with location and severity
//! - `DiagnosticBag` - A collection of diagnostics for a compilation phase
//! - `DiagnosticSeverity` - Error, Warning, or Note
//! - `diagnostic_codes` - Stable numeric codes, looked up in `DIAGNOSTIC_MESSAGES`
//!
//! # Example
//!
//! ```ignore
//! let mut bag = DiagnosticBag::new();
//! bag.error_in("A.java", span, "Duplicate class: 'p.A'.", diagnostic_codes::DUPLICATE_CLASS);
//! ```

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Severity
// =============================================================================

/// The severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Informational note
    Note = 3,
    /// A warning
    Warning = 2,
    /// An error (highest severity)
    Error = 1,
}

impl DiagnosticSeverity {
    /// Get the severity name for display.
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Note => "note",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DiagnosticSeverity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, DiagnosticSeverity::Warning)
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Codes and message templates
// =============================================================================

pub mod diagnostic_codes {
    pub const DUPLICATE_CLASS: u32 = 1001;
    pub const ALREADY_DEFINED: u32 = 1002;
    pub const ALREADY_DEFINED_SINGLE_IMPORT: u32 = 1003;
    pub const ALREADY_DEFINED_THIS_UNIT: u32 = 1004;
    pub const CYCLIC_INHERITANCE: u32 = 1005;
    pub const PACKAGE_DOES_NOT_EXIST: u32 = 1006;
    pub const CANNOT_FIND_SYMBOL: u32 = 1007;
    pub const CANNOT_FIND_STATIC_MEMBER: u32 = 1008;
    pub const CLASS_CLASHES_WITH_PACKAGE: u32 = 1009;
    pub const PACKAGE_CLASHES_WITH_CLASS: u32 = 1010;
    pub const DUPLICATE_MIXIN: u32 = 1011;
    pub const PUBLIC_CLASS_FILE_NAME: u32 = 1012;
    pub const MODIFIER_NOT_ALLOWED: u32 = 1013;
    pub const ILLEGAL_MODIFIER_COMBINATION: u32 = 1014;
    pub const CANNOT_ACCESS: u32 = 1015;
    pub const REPEATED_INTERFACE: u32 = 1016;
    pub const ALREADY_DEFINED_IN_METHOD: u32 = 1017;
    pub const TYPE_EXPECTED: u32 = 1018;
    pub const NON_STATIC_REFERENCE: u32 = 1019;
    pub const REFERENCE_BEFORE_SUPER_CALL: u32 = 1020;
    pub const INTERFACE_EXPECTED: u32 = 1021;
    pub const NO_ROOT_PACKAGE: u32 = 1900;

    pub const DEPRECATED_TYPE: u32 = 2001;
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub severity: DiagnosticSeverity,
    pub message: &'static str,
}

const fn error(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        severity: DiagnosticSeverity::Error,
        message,
    }
}

const fn warning(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        severity: DiagnosticSeverity::Warning,
        message,
    }
}

use diagnostic_codes as codes;

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    error(codes::DUPLICATE_CLASS, "Duplicate class: '{0}'."),
    error(codes::ALREADY_DEFINED, "'{0}' is already defined in '{1}'."),
    error(
        codes::ALREADY_DEFINED_SINGLE_IMPORT,
        "'{0}' is already defined in a single-type import.",
    ),
    error(
        codes::ALREADY_DEFINED_THIS_UNIT,
        "'{0}' is already defined in this compilation unit.",
    ),
    error(codes::CYCLIC_INHERITANCE, "Cyclic inheritance involving '{0}'."),
    error(codes::PACKAGE_DOES_NOT_EXIST, "Package '{0}' does not exist."),
    error(codes::CANNOT_FIND_SYMBOL, "Cannot find symbol '{0}'."),
    error(
        codes::CANNOT_FIND_STATIC_MEMBER,
        "Cannot find static member '{0}' in '{1}'.",
    ),
    error(
        codes::CLASS_CLASHES_WITH_PACKAGE,
        "Class '{0}' clashes with package of the same name.",
    ),
    error(
        codes::PACKAGE_CLASHES_WITH_CLASS,
        "Package '{0}' clashes with class of the same name.",
    ),
    error(codes::DUPLICATE_MIXIN, "Duplicate mixin '{0}'."),
    error(
        codes::PUBLIC_CLASS_FILE_NAME,
        "Class '{0}' is public, should be declared in a file named '{1}'.",
    ),
    error(codes::MODIFIER_NOT_ALLOWED, "Modifier '{0}' not allowed here."),
    error(
        codes::ILLEGAL_MODIFIER_COMBINATION,
        "Illegal combination of modifiers: '{0}' and '{1}'.",
    ),
    error(codes::CANNOT_ACCESS, "Cannot access '{0}': {1}."),
    error(codes::REPEATED_INTERFACE, "Repeated interface '{0}'."),
    error(
        codes::ALREADY_DEFINED_IN_METHOD,
        "Variable '{0}' is already defined in method '{1}'.",
    ),
    error(codes::TYPE_EXPECTED, "Class or interface type expected, found '{0}'."),
    error(
        codes::NON_STATIC_REFERENCE,
        "Non-static '{0}' cannot be referenced from a static context.",
    ),
    error(
        codes::REFERENCE_BEFORE_SUPER_CALL,
        "Cannot reference '{0}' before supertype constructor has been called.",
    ),
    error(codes::INTERFACE_EXPECTED, "Interface expected here, found '{0}'."),
    error(
        codes::NO_ROOT_PACKAGE,
        "Fatal error: unable to find package '{0}' in the class path.",
    ),
    warning(codes::DEPRECATED_TYPE, "'{0}' has been deprecated."),
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
///
/// Returns the template string with `{0}`, `{1}`, etc. placeholders.
/// Use `format_message()` to fill in the placeholders.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

// =============================================================================
// Diagnostic
// =============================================================================

/// A diagnostic message with location, severity, and code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The file containing the diagnostic
    pub file_name: String,
    /// The source span (byte offsets)
    pub span: Span,
    /// The diagnostic message
    pub message: String,
    /// The severity level
    pub severity: DiagnosticSeverity,
    /// The diagnostic code
    pub code: u32,
}

impl Diagnostic {
    pub fn new(
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        severity: DiagnosticSeverity,
        code: u32,
    ) -> Self {
        Diagnostic {
            file_name: file_name.into(),
            span,
            message: message.into(),
            severity,
            code,
        }
    }

    /// Create a diagnostic from a registered code, filling the template with `args`.
    ///
    /// Unknown codes produce an error whose message is the joined arguments.
    pub fn from_code(file_name: impl Into<String>, span: Span, code: u32, args: &[&str]) -> Self {
        match get_diagnostic_message(code) {
            Some(def) => Self::new(
                file_name,
                span,
                format_message(def.message, args),
                def.severity,
                code,
            ),
            None => Self::new(
                file_name,
                span,
                args.join(" "),
                DiagnosticSeverity::Error,
                code,
            ),
        }
    }

    pub fn error(
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self::new(file_name, span, message, DiagnosticSeverity::Error, code)
    }

    pub fn warning(
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self::new(file_name, span, message, DiagnosticSeverity::Warning, code)
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    pub fn is_warning(&self) -> bool {
        self.severity.is_warning()
    }

    /// Format the diagnostic in a simple format.
    ///
    /// Returns a string like: "A.java[12..18]: error J1001: Duplicate class: 'p.A'."
    pub fn format_simple(&self) -> String {
        format!(
            "{}[{}]: {} J{}: {}",
            self.file_name, self.span, self.severity, self.code, self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

// =============================================================================
// DiagnosticBag
// =============================================================================

/// A collection of diagnostics for a compilation phase.
///
/// Adding to a bag never fails, so reporting code can always continue with
/// the next declaration.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        DiagnosticBag::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Error => self.error_count += 1,
            DiagnosticSeverity::Warning => self.warning_count += 1,
            DiagnosticSeverity::Note => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Add a diagnostic built from a registered code.
    pub fn report(&mut self, file_name: &str, span: Span, code: u32, args: &[&str]) {
        self.add(Diagnostic::from_code(file_name, span, code, args));
    }

    /// Add an error diagnostic with explicit file.
    pub fn error_in(
        &mut self,
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) {
        self.add(Diagnostic::error(file_name, span, message, code));
    }

    /// Add a warning diagnostic with explicit file.
    pub fn warning_in(
        &mut self,
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) {
        self.add(Diagnostic::warning(file_name, span, message, code));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Get all diagnostics as a slice.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics carrying the given code.
    pub fn with_code(&self, code: u32) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    /// Number of diagnostics carrying the given code.
    pub fn count_code(&self, code: u32) -> usize {
        self.with_code(code).count()
    }

    /// Take all diagnostics out of the bag, resetting the counters.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        self.warning_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}
