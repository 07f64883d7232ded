//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a compact terminal format.
///
/// Produces output like:
/// ```text
/// error[10511002]: bytecode build error: Syntax error in compiled source
///   --> /cache/temporary/entry/a.js:3:7
///    = cause: Unexpected token '}'
///    = help: Check the reported position for invalid syntax.
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[1;{}m{text}\x1b[0m", severity.ansi_color())
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}: {}\n",
            self.paint(diag.severity, &head),
            diag.code.kind.headline(),
            diag.description
        ));

        if let Some(position) = &diag.position {
            out.push_str(&format!("  --> {position}\n"));
        }
        if let Some(cause) = &diag.cause {
            for (i, line) in cause.lines().enumerate() {
                let label = if i == 0 { "cause" } else { "     " };
                out.push_str(&format!("   = {label}: {line}\n"));
            }
        }
        for solution in &diag.solutions {
            out.push_str(&format!("   = help: {solution}\n"));
        }

        out
    }
}

/// Renders one diagnostic per line as JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        serde_json::to_string(diag).unwrap_or_else(|_| "{}".to_string())
    }
}
