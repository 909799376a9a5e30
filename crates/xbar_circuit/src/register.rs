//! Flip-flop register buffers used inside a processing element.

use crate::cost::ModuleCost;
use crate::technology::{LogicCell, Technology};
use xbar_common::Frequency;

/// A bank of `num_dff` flip-flops clocked once per access.
#[derive(Debug, Clone)]
pub struct RegisterBuffer {
    num_dff: usize,
    clock: Frequency,
    tech: Technology,
}

impl RegisterBuffer {
    /// Creates a bank of flip-flops.
    pub fn new(num_dff: usize, clock: Frequency, tech: Technology) -> Self {
        Self {
            num_dff,
            clock,
            tech,
        }
    }

    /// Cost of `num_read` accesses of `num_dff_per_access` bits each.
    ///
    /// Every access occupies one clock cycle.
    pub fn calculate(&self, num_dff_per_access: f64, num_read: f64) -> ModuleCost {
        let dff = self.tech.cell(LogicCell::Dff);
        ModuleCost::new(
            self.clock.cycles(num_read),
            num_dff_per_access * num_read * dff.energy,
        )
    }

    /// Layout area (m²).
    pub fn area(&self) -> f64 {
        self.num_dff as f64 * self.tech.cell(LogicCell::Dff).area
    }

    /// Leakage power (W).
    pub fn leakage(&self) -> f64 {
        self.num_dff as f64 * self.tech.cell(LogicCell::Dff).leakage
    }
}
