//! Thread-safe diagnostic accumulator shared by the pipeline stages.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Collected {
    items: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

/// Collects the diagnostics of one invocation.
///
/// Stages hold a shared reference; worker-pool reader threads may emit
/// concurrently.
#[derive(Default)]
pub struct DiagnosticSink {
    collected: Mutex<Collected>,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `diag`.
    pub fn emit(&self, diag: Diagnostic) {
        let mut c = self.lock();
        match diag.severity {
            Severity::Error => c.errors += 1,
            Severity::Warning => c.warnings += 1,
            Severity::Note => {}
        }
        c.items.push(diag);
    }

    /// Records every diagnostic in `diags`, in order.
    pub fn extend(&self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.emit(diag);
        }
    }

    /// Whether an error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of error-severity diagnostics recorded.
    pub fn error_count(&self) -> usize {
        self.lock().errors
    }

    /// Number of warnings recorded, e.g. degraded module URLs.
    pub fn warning_count(&self) -> usize {
        self.lock().warnings
    }

    /// Drains the sink in emission order and resets the counters.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock()).items
    }

    /// A copy of the recorded diagnostics, leaving the sink intact.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().items.clone()
    }

    // A panic while holding the lock cannot leave `Collected` half-written.
    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.collected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;

    fn compiler_error() -> Diagnostic {
        Diagnostic::error(DiagnosticCode::COMPILER_FAILED, "compile failed")
    }

    fn degraded_url() -> Diagnostic {
        Diagnostic::warning(DiagnosticCode::RESOLVE_FAILED, "could not resolve")
    }

    #[test]
    fn starts_empty() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn counts_by_severity() {
        let sink = DiagnosticSink::new();
        sink.extend([degraded_url(), degraded_url(), compiler_error()]);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 2);
        assert_eq!(sink.diagnostics().len(), 3);
    }

    #[test]
    fn take_all_preserves_order_and_resets() {
        let sink = DiagnosticSink::new();
        sink.emit(degraded_url());
        sink.emit(compiler_error());
        let taken = sink.take_all();
        assert_eq!(taken[0].severity, Severity::Warning);
        assert_eq!(taken[1].severity, Severity::Error);
        assert!(sink.diagnostics().is_empty());
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn concurrent_emit() {
        let sink = DiagnosticSink::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..25 {
                        sink.emit(compiler_error());
                    }
                });
            }
        });
        assert_eq!(sink.error_count(), 100);
    }
}
