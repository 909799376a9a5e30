//! Diagnostic rendering for terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[C001]: cell precision exceeds synapse precision
///   --> memory cell
///    = note: cell_bit corrected from 4 to 2
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

    fn paint_severity(&self, severity: Severity) -> String {
        if self.color {
            format!("{}{severity}\x1b[0m", severity.ansi())
        } else {
            severity.to_string()
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!(
            "{}[{}]: {}\n",
            self.paint_severity(diag.severity),
            diag.code,
            diag.message
        );

        if let Some(context) = &diag.context {
            out.push_str(&format!("  --> {context}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_warning_with_context_and_notes() {
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Config, 2),
            "num_col_muxed exceeds subarray columns",
        )
        .with_context("subarray")
        .with_note("clamped from 256 to 128")
        .with_help("set num_col_muxed <= num_col_subarray");

        let output = TerminalRenderer::new(false).render(&diag);
        assert!(output.contains("warning[C002]: num_col_muxed exceeds subarray columns"));
        assert!(output.contains("--> subarray"));
        assert!(output.contains("= note: clamped from 256 to 128"));
        assert!(output.contains("= help: set num_col_muxed <= num_col_subarray"));
    }

    #[test]
    fn render_without_context() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 9), "general error");
        let output = TerminalRenderer::new(false).render(&diag);
        assert_eq!(output, "error[E009]: general error\n");
    }

    #[test]
    fn render_with_color() {
        let diag = Diagnostic::note(DiagnosticCode::new(Category::Floorplan, 1), "clamped");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.contains("\x1b["));
        assert!(output.contains("[F001]: clamped"));
    }
}
