//! Collects the corrections and clamps reported while a run resolves
//! parameters, plans the chip and estimates layers.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Shared, append-only diagnostic collector.
///
/// Estimators take it by `&` reference. Per-severity counts are atomic, so
/// checking for errors never takes the lock.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    counts: [AtomicUsize; 4],
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            counts: Default::default(),
        }
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        self.counts[diag.severity.index()].fetch_add(1, Ordering::Relaxed);
        self.diagnostics.lock().unwrap().push(diag);
    }

    /// Number of diagnostics emitted with exactly this severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity.index()].load(Ordering::Relaxed)
    }

    /// Whether any error was emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of errors emitted.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warnings emitted.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Whether a diagnostic with the given code (e.g. `"F001"`) was emitted.
    ///
    /// A malformed code matches nothing.
    pub fn has_code(&self, code: &str) -> bool {
        let Ok(code) = code.parse::<DiagnosticCode>() else {
            return false;
        };
        self.diagnostics.lock().unwrap().iter().any(|d| d.code == code)
    }

    /// Diagnostics of at least `min` severity, in emission order.
    pub fn at_least(&self, min: Severity) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.severity >= min)
            .cloned()
            .collect()
    }

    /// Drains all diagnostics. Counts are kept.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock().unwrap())
    }

    /// Snapshot of all diagnostics, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.at_least(Severity::Help)
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
