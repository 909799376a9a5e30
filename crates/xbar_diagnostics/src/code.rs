//! Diagnostic codes: a category letter plus a three-digit number.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Generic fatal errors, prefixed with `E`.
    Error,
    /// Generic warnings, prefixed with `W`.
    Warning,
    /// Parameter-store corrections, prefixed with `C`.
    Config,
    /// Floor-planning clamps and mapping decisions, prefixed with `F`.
    Floorplan,
    /// Estimation-time clamps, prefixed with `P`.
    Performance,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Config => 'C',
            Category::Floorplan => 'F',
            Category::Performance => 'P',
        }
    }

    /// The category with the given prefix letter.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        [
            Category::Error,
            Category::Warning,
            Category::Config,
            Category::Floorplan,
            Category::Performance,
        ]
        .into_iter()
        .find(|c| c.prefix() == prefix)
    }
}

/// A category prefix plus a numeric identifier, displayed as e.g. `C001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

impl FromStr for DiagnosticCode {
    type Err = ();

    /// Parses the displayed form, e.g. `"F001"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars.next().and_then(Category::from_prefix).ok_or(())?;
        let number = chars.as_str().parse().map_err(|_| ())?;
        Ok(Self::new(category, number))
    }
}
