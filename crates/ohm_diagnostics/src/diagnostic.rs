//! Structured diagnostic records.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured error record surfaced to the host.
///
/// Each diagnostic includes:
/// - A severity level and an eight-digit code
/// - A one-line description of what went wrong
/// - An optional cause (usually the captured text of a failing tool)
/// - An optional position (file, or file:line when known)
/// - Remediation steps the user can try
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the kind of failure.
    pub code: DiagnosticCode,
    /// The main description.
    pub description: String,
    /// The underlying cause, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Where the failure happened, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Remediation steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solutions: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code and description.
    pub fn error(code: DiagnosticCode, description: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, description)
    }

    /// Creates a new warning diagnostic with the given code and description.
    pub fn warning(code: DiagnosticCode, description: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, description)
    }

    fn with_severity(severity: Severity, code: DiagnosticCode, description: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            description: description.into(),
            cause: None,
            position: None,
            solutions: Vec::new(),
        }
    }

    /// Sets the cause of this diagnostic.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Sets the position of this diagnostic.
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Adds a remediation step.
    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solutions.push(solution.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error() {
        let diag = Diagnostic::error(DiagnosticCode::RESOLVE_FAILED, "Failed to resolve module URL");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.to_string(), "10311001");
        assert!(diag.cause.is_none());
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::warning(DiagnosticCode::RESOLVE_FAILED, "Failed to resolve module URL")
            .with_cause("no module root prefixes the path")
            .with_position("/elsewhere/a.ets")
            .with_solution("Add the module to [modules]")
            .with_solution("Check the path spelling");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.cause.as_deref(), Some("no module root prefixes the path"));
        assert_eq!(diag.position.as_deref(), Some("/elsewhere/a.ets"));
        assert_eq!(diag.solutions.len(), 2);
    }

    #[test]
    fn json_omits_empty_fields() {
        let diag = Diagnostic::error(DiagnosticCode::CACHE_IO, "ledger unreadable");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("cause"));
        assert!(!json.contains("solutions"));
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diag);
    }
}
