//! Host-visible diagnostics.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which part of the session raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSource {
    Decode,
    Preview,
    Caption,
}

/// A notification for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: DiagnosticSource,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self {
            severity,
            source,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.severity, self.source, self.message)
    }
}

/// Callback receiving every diagnostic a session emits.
pub type DiagnosticCallback = Box<dyn Fn(&Diagnostic) + Send>;
