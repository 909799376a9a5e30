//! Diagnostic severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a diagnostic is.
///
/// Declaration order is the ordering: `Help < Note < Warning < Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A suggestion attached to nothing in particular.
    Help,
    /// An expected clamp or mapping decision, e.g. a duplication factor rounded up to 1.
    Note,
    /// A correction the user should review; estimation continues.
    Warning,
    /// A definite problem; the driver stops after reporting it.
    Error,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Help,
        Severity::Note,
        Severity::Warning,
        Severity::Error,
    ];

    /// Returns `true` for [`Severity::Error`].
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// The lowest severity shown for the given output flags.
    ///
    /// `quiet` keeps errors only, `verbose` shows everything, and the default
    /// hides notes and help.
    pub fn threshold(quiet: bool, verbose: bool) -> Severity {
        if quiet {
            Severity::Error
        } else if verbose {
            Severity::Help
        } else {
            Severity::Warning
        }
    }

    /// Lowercase label used in rendered output.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Help => "help",
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Bold ANSI colour escape for terminal output.
    pub fn ansi(self) -> &'static str {
        match self {
            Severity::Error => "\x1b[1;31m",
            Severity::Warning => "\x1b[1;33m",
            Severity::Note => "\x1b[1;36m",
            Severity::Help => "\x1b[1;32m",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_declaration() {
        assert!(Severity::ALL.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Severity::ALL.map(Severity::index), [0, 1, 2, 3]);
    }

    #[test]
    fn threshold_by_flags() {
        assert_eq!(Severity::threshold(true, true), Severity::Error);
        assert_eq!(Severity::threshold(false, true), Severity::Help);
        assert_eq!(Severity::threshold(false, false), Severity::Warning);
    }

    #[test]
    fn labels_and_json() {
        assert_eq!(Severity::Note.to_string(), "note");
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}
