//! Max-pooling unit applied after layers flagged for pooling.

use crate::cost::ModuleCost;
use crate::technology::{LogicCell, Technology};
use xbar_common::log2_ceil;

/// `num_unit` comparator trees reducing a `window`-element window of `num_bit`-bit values.
#[derive(Debug, Clone)]
pub struct MaxPool {
    num_bit: usize,
    window: usize,
    num_unit: usize,
    tech: Technology,
}

impl MaxPool {
    /// Creates a pooling unit.
    pub fn new(num_bit: usize, window: usize, num_unit: usize, tech: Technology) -> Self {
        Self {
            num_bit,
            window: window.max(1),
            num_unit: num_unit.max(1),
            tech,
        }
    }

    fn comparator_bits(&self) -> f64 {
        ((self.window - 1) * self.num_bit) as f64
    }

    /// Cost of `num_read` pooling operations per unit.
    pub fn calculate(&self, num_read: f64) -> ModuleCost {
        let fa = self.tech.cell(LogicCell::FullAdder);
        let depth = log2_ceil(self.window) as f64;
        ModuleCost::new(
            num_read * depth * self.num_bit as f64 * fa.delay,
            num_read * self.num_unit as f64 * self.comparator_bits() * fa.energy,
        )
    }

    /// Layout area (m²).
    pub fn area(&self) -> f64 {
        self.num_unit as f64 * self.comparator_bits() * self.tech.cell(LogicCell::FullAdder).area
    }

    /// Leakage power (W).
    pub fn leakage(&self) -> f64 {
        self.num_unit as f64 * self.comparator_bits() * self.tech.cell(LogicCell::FullAdder).leakage
    }
}
