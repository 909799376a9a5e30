//! Cost values returned by the circuit models.

use serde::Serialize;
use std::ops::{Add, AddAssign};

/// Latency (s) and dynamic energy (J) of one module invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleCost {
    /// Latency in seconds.
    pub latency: f64,
    /// Dynamic energy in joules.
    pub dynamic_energy: f64,
}

impl ModuleCost {
    /// The cost of doing nothing.
    pub const ZERO: ModuleCost = ModuleCost {
        latency: 0.0,
        dynamic_energy: 0.0,
    };

    /// Creates a cost value.
    pub fn new(latency: f64, dynamic_energy: f64) -> Self {
        Self {
            latency,
            dynamic_energy,
        }
    }

    /// Returns `true` when the module contributed nothing.
    pub fn is_zero(&self) -> bool {
        self.latency == 0.0 && self.dynamic_energy == 0.0
    }
}

impl Add for ModuleCost {
    type Output = ModuleCost;

    fn add(self, rhs: ModuleCost) -> ModuleCost {
        ModuleCost::new(
            self.latency + rhs.latency,
            self.dynamic_energy + rhs.dynamic_energy,
        )
    }
}

impl AddAssign for ModuleCost {
    fn add_assign(&mut self, rhs: ModuleCost) {
        *self = *self + rhs;
    }
}

/// Read and write cost of a buffer access pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BufferCost {
    /// Total read latency (s).
    pub read_latency: f64,
    /// Total write latency (s).
    pub write_latency: f64,
    /// Total read energy (J).
    pub read_energy: f64,
    /// Total write energy (J).
    pub write_energy: f64,
}

impl BufferCost {
    /// Read plus write latency.
    pub fn latency(&self) -> f64 {
        self.read_latency + self.write_latency
    }

    /// Read plus write energy.
    pub fn energy(&self) -> f64 {
        self.read_energy + self.write_energy
    }
}

/// Per-read cost of a subarray, already split into the reporting buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubArrayCost {
    /// ADC conversion latency (s).
    pub latency_adc: f64,
    /// Shift-add latency (s).
    pub latency_accumulation: f64,
    /// Decoder, wordline, bitline and mux latency (s).
    pub latency_other: f64,
    /// ADC energy (J).
    pub energy_adc: f64,
    /// Shift-add energy (J).
    pub energy_accumulation: f64,
    /// Array, decoder and mux energy (J).
    pub energy_other: f64,
}

impl SubArrayCost {
    /// Total latency of the read.
    pub fn latency(&self) -> f64 {
        self.latency_adc + self.latency_accumulation + self.latency_other
    }

    /// Total dynamic energy of the read.
    pub fn dynamic_energy(&self) -> f64 {
        self.energy_adc + self.energy_accumulation + self.energy_other
    }
}

/// Area of a block (m²) with its ADC/accumulation/other/interconnect split.
///
/// `ic` is informational: interconnect area is also counted in `other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AreaBreakdown {
    /// Block height (m).
    pub height: f64,
    /// Block width (m).
    pub width: f64,
    /// Total area (m²).
    pub area: f64,
    /// Interconnect area (m²).
    pub ic: f64,
    /// ADC area (m²).
    pub adc: f64,
    /// Accumulation area (m²).
    pub accumulation: f64,
    /// Everything else (m²).
    pub other: f64,
}

impl AreaBreakdown {
    /// A square block of the given area with no breakdown.
    pub fn square(area: f64) -> Self {
        let side = area.max(0.0).sqrt();
        Self {
            height: side,
            width: side,
            area,
            other: area,
            ..Default::default()
        }
    }

    /// Sets height and width to a square of the current total area.
    pub fn with_square_outline(mut self) -> Self {
        let side = self.area.max(0.0).sqrt();
        self.height = side;
        self.width = side;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_cost_adds() {
        let mut a = ModuleCost::new(1e-9, 2e-12);
        a += ModuleCost::new(1e-9, 1e-12);
        assert!((a.latency - 2e-9).abs() < 1e-21);
        assert!((a.dynamic_energy - 3e-12).abs() < 1e-24);
        assert!(ModuleCost::ZERO.is_zero());
    }

    #[test]
    fn buffer_cost_totals() {
        let cost = BufferCost {
            read_latency: 1.0,
            write_latency: 2.0,
            read_energy: 3.0,
            write_energy: 4.0,
        };
        assert_eq!(cost.latency(), 3.0);
        assert_eq!(cost.energy(), 7.0);
    }

    #[test]
    fn square_outline() {
        let area = AreaBreakdown::square(4e-12);
        assert!((area.height - 2e-6).abs() < 1e-18);
        assert_eq!(area.other, 4e-12);
    }

    #[test]
    fn costs_serialize_with_bucket_names() {
        let area = serde_json::to_value(AreaBreakdown::square(4e-12)).unwrap();
        assert_eq!(area["area"], 4e-12);
        assert_eq!(area["adc"], 0.0);
        assert_eq!(area.as_object().unwrap().len(), 7);

        let read = SubArrayCost {
            latency_adc: 1e-9,
            energy_other: 2e-12,
            ..Default::default()
        };
        let json = serde_json::to_value(read).unwrap();
        assert_eq!(json["latency_adc"], 1e-9);
        assert_eq!(json["energy_other"], 2e-12);
        assert_eq!(json["latency_accumulation"], 0.0);
    }
}
