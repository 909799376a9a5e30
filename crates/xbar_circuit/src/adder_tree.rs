//! Binary adder trees combining partial sums from several arrays.

use crate::cost::ModuleCost;
use crate::technology::{LogicCell, Technology};
use xbar_common::log2_ceil;

/// A bank of identical binary adder trees.
///
/// Each tree reduces up to `num_input` operands of `num_adder_bit` bits; the
/// adder width grows by one bit per stage.
#[derive(Debug, Clone)]
pub struct AdderTree {
    num_input: usize,
    num_adder_bit: usize,
    num_adder_tree: usize,
    num_stage: u32,
    tech: Technology,
}

impl AdderTree {
    /// Creates `num_adder_tree` trees of `num_input` operands each.
    pub fn new(
        num_input: usize,
        num_adder_bit: usize,
        num_adder_tree: usize,
        tech: Technology,
    ) -> Self {
        Self {
            num_input: num_input.max(1),
            num_adder_bit,
            num_adder_tree: num_adder_tree.max(1),
            num_stage: log2_ceil(num_input.max(1)),
            tech,
        }
    }

    /// Operand width.
    pub fn num_adder_bit(&self) -> usize {
        self.num_adder_bit
    }

    /// Number of reduction stages of a full tree.
    pub fn num_stage(&self) -> u32 {
        self.num_stage
    }

    /// Width of the final sum.
    pub fn output_bits(&self) -> usize {
        self.num_adder_bit + self.num_stage as usize
    }

    /// Cost of `num_read` reductions of `num_unit_add` operands each.
    ///
    /// Reducing a single operand is free.
    pub fn calculate(&self, num_read: f64, num_unit_add: usize) -> ModuleCost {
        let operands = num_unit_add.min(self.num_input);
        let stages = log2_ceil(operands);
        if stages == 0 || num_read <= 0.0 {
            return ModuleCost::ZERO;
        }
        let fa = self.tech.cell(LogicCell::FullAdder);

        let mut latency = 0.0;
        let mut energy = 0.0;
        let mut remaining = operands;
        for stage in 0..stages {
            let width = (self.num_adder_bit + stage as usize) as f64;
            let adders = remaining / 2;
            latency += width * fa.delay;
            energy += adders as f64 * width * fa.energy;
            remaining = remaining.div_ceil(2);
        }
        ModuleCost::new(
            num_read * latency,
            num_read * self.num_adder_tree as f64 * energy,
        )
    }

    fn full_tree_adder_bits(&self) -> f64 {
        let mut bits = 0.0;
        let mut remaining = self.num_input;
        for stage in 0..self.num_stage {
            bits += (remaining / 2) as f64 * (self.num_adder_bit + stage as usize) as f64;
            remaining = remaining.div_ceil(2);
        }
        bits
    }

    /// Layout area (m²).
    pub fn area(&self) -> f64 {
        self.num_adder_tree as f64
            * self.full_tree_adder_bits()
            * self.tech.cell(LogicCell::FullAdder).area
    }

    /// Leakage power (W).
    pub fn leakage(&self) -> f64 {
        self.num_adder_tree as f64
            * self.full_tree_adder_bits()
            * self.tech.cell(LogicCell::FullAdder).leakage
    }
}
