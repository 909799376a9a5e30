//! Clock frequency of the synchronous peripherals (buffers, registers).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit suffixes, largest first. Matching is case-insensitive.
const UNITS: [(&str, f64); 4] = [("ghz", 1e9), ("mhz", 1e6), ("khz", 1e3), ("hz", 1.0)];

/// A clock frequency in Hz.
///
/// Parsed from the `chip.clock` string, e.g. `"1GHz"`, `"500MHz"` or a bare
/// number of Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// A frequency of `hz` Hz.
    pub fn new(hz: f64) -> Self {
        Self(hz)
    }

    /// Value in Hz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Clock period (s).
    pub fn period(&self) -> f64 {
        1.0 / self.0
    }

    /// Duration of `cycles` clock cycles (s). Fractional cycles are allowed.
    pub fn cycles(&self, cycles: f64) -> f64 {
        cycles * self.period()
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self(1e9)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (unit, scale) = UNITS
            .iter()
            .find(|(_, scale)| self.0 >= *scale)
            .copied()
            .unwrap_or(("hz", 1.0));
        let label = match unit {
            "ghz" => "GHz",
            "mhz" => "MHz",
            "khz" => "KHz",
            _ => "Hz",
        };
        write!(f, "{}{label}", self.0 / scale)
    }
}

/// A clock string that is not a positive number with an optional unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frequency: '{input}'")]
pub struct ParseFrequencyError {
    /// The rejected string.
    pub input: String,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let lower = text.to_ascii_lowercase();
        let (number, scale) = UNITS
            .iter()
            .find_map(|(suffix, scale)| lower.strip_suffix(suffix).map(|n| (n, *scale)))
            .unwrap_or((lower.as_str(), 1.0));

        match number.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(Frequency(value * scale)),
            _ => Err(ParseFrequencyError {
                input: text.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        let f: Frequency = "1GHz".parse().unwrap();
        assert_eq!(f.hz(), 1e9);
        assert!((f.period() - 1e-9).abs() < 1e-21);
        assert_eq!("500mhz".parse::<Frequency>().unwrap().hz(), 5e8);
        assert_eq!(" 250 KHz ".parse::<Frequency>().unwrap().hz(), 2.5e5);
        assert_eq!("2e9".parse::<Frequency>().unwrap().hz(), 2e9);
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        assert!("0GHz".parse::<Frequency>().is_err());
        assert!("-1MHz".parse::<Frequency>().is_err());
        assert_eq!(
            "fast".parse::<Frequency>().unwrap_err().to_string(),
            "invalid frequency: 'fast'"
        );
    }

    #[test]
    fn cycles_scale_the_period() {
        let f = Frequency::new(5e8);
        assert!((f.cycles(3.0) - 6e-9).abs() < 1e-21);
        assert_eq!(f.cycles(0.0), 0.0);
    }

    #[test]
    fn displays_in_the_largest_unit() {
        assert_eq!(Frequency::new(1e9).to_string(), "1GHz");
        assert_eq!(Frequency::new(2e8).to_string(), "200MHz");
        assert_eq!(Frequency::new(500.0).to_string(), "500Hz");
        assert_eq!(Frequency::default(), Frequency::new(1e9));
    }

    #[test]
    fn serializes_as_bare_hz() {
        let json = serde_json::to_string(&Frequency::new(5e8)).unwrap();
        assert_eq!(json, "500000000.0");
        let back: Frequency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Frequency::new(5e8));
    }
}
