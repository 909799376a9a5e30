//! Structured diagnostics for configuration corrections and estimation clamps.
//!
//! Every auto-correction, clamp, or fatal inconsistency the estimator detects is
//! reported as a [`Diagnostic`] with a severity and a category-prefixed code. The
//! thread-safe [`DiagnosticSink`] accumulates them, and [`TerminalRenderer`]
//! formats them for the command line.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
