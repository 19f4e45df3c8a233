//! Recoverable conversion findings
//!
//! Anything that does not abort a conversion but changes its output is
//! reported here: text that had nowhere to go, and markup the converter
//! recognises but does not model. Each diagnostic is also emitted through
//! `tracing` at the moment it is recorded.

use std::fmt;

/// A non-fatal finding recorded while building or rendering a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level of the diagnostic
    pub severity: Severity,

    /// What kind of anomaly was found
    pub kind: DiagnosticKind,

    /// The diagnostic message
    pub message: String,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Warning, content may be missing or approximated
    Warning,
}

/// Category of a recoverable anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Character data arrived with no open paragraph, note or citation
    UnroutableText,
    /// A recognised construct whose semantics are not modeled
    UnmodeledConstruct,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
        }
    }

    /// Text content dropped for lack of a destination
    pub fn unroutable_text(text: &str) -> Self {
        let diag = Self::new(
            Severity::Warning,
            DiagnosticKind::UnroutableText,
            format!("Unhandled content: {:?}", text),
        );
        tracing::warn!("{}", diag.message);
        diag
    }

    /// A construct handled with best-effort semantics
    pub fn unmodeled(message: impl Into<String>) -> Self {
        let diag = Self::new(
            Severity::Warning,
            DiagnosticKind::UnmodeledConstruct,
            message,
        );
        tracing::warn!("{}", diag.message);
        diag
    }

    /// Check if this diagnostic is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unroutable_text_diagnostic() {
        let diag = Diagnostic::unroutable_text("stray");
        assert_eq!(diag.kind, DiagnosticKind::UnroutableText);
        assert!(diag.is_warning());
        assert_eq!(diag.to_string(), "warning: Unhandled content: \"stray\"");
    }

    #[test]
    fn test_unmodeled_diagnostic() {
        let diag = Diagnostic::unmodeled("list continues numbering");
        assert_eq!(diag.kind, DiagnosticKind::UnmodeledConstruct);
        assert_eq!(diag.message, "list continues numbering");
    }
}
