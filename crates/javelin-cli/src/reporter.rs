//! Human-readable diagnostic output.

use colored::Colorize;
use javelin_common::{Diagnostic, DiagnosticSeverity};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// One line per diagnostic, in report order.
    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| self.format_diagnostic(d))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `file[start..end] - severity Jcode: message`
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let location = self.format_location(diagnostic);
        let severity = self.format_severity(diagnostic.severity);
        let code = self.format_code(diagnostic.code);
        format!("{location} - {severity} {code}: {}", diagnostic.message)
    }

    /// `Found 2 errors and 1 warning.`, or an empty string for a clean run.
    pub fn summary(&self, errors: usize, warnings: usize) -> String {
        let plural = |n: usize, word: &str| {
            if n == 1 {
                format!("1 {word}")
            } else {
                format!("{n} {word}s")
            }
        };
        let text = match (errors, warnings) {
            (0, 0) => return String::new(),
            (e, 0) => format!("Found {}.", plural(e, "error")),
            (0, w) => format!("Found {}.", plural(w, "warning")),
            (e, w) => format!("Found {} and {}.", plural(e, "error"), plural(w, "warning")),
        };
        if self.color && errors > 0 {
            text.red().to_string()
        } else {
            text
        }
    }

    fn format_location(&self, diagnostic: &Diagnostic) -> String {
        let file = if diagnostic.file_name.is_empty() {
            "<unknown>"
        } else {
            diagnostic.file_name.as_str()
        };
        if !self.color {
            return format!("{file}[{}]", diagnostic.span);
        }
        format!(
            "{}[{}]",
            file.cyan(),
            diagnostic.span.to_string().yellow()
        )
    }

    fn format_severity(&self, severity: DiagnosticSeverity) -> String {
        let label = severity.name();
        if !self.color {
            return label.to_string();
        }
        match severity {
            DiagnosticSeverity::Error => label.red().bold().to_string(),
            DiagnosticSeverity::Warning => label.yellow().bold().to_string(),
            DiagnosticSeverity::Note => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("J{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
