//! Activation units: ReLU as a bit shifter, sigmoid as a lookup table.

use crate::cost::ModuleCost;
use crate::technology::{LogicCell, Technology};
use xbar_config::ActivationKind;

/// ReLU implemented by clamping and truncating each accumulated sum.
#[derive(Debug, Clone)]
pub struct BitShifter {
    num_unit: usize,
    num_bit: usize,
    tech: Technology,
}

impl BitShifter {
    /// Creates `num_unit` shifters producing `num_bit`-bit outputs.
    pub fn new(num_unit: usize, num_bit: usize, tech: Technology) -> Self {
        Self {
            num_unit: num_unit.max(1),
            num_bit,
            tech,
        }
    }

    fn cell_delay(&self) -> f64 {
        self.tech.cell(LogicCell::Mux2).delay + self.tech.cell(LogicCell::Dff).delay
    }

    fn cell_energy(&self) -> f64 {
        self.tech.cell(LogicCell::Mux2).energy + self.tech.cell(LogicCell::Dff).energy
    }

    fn cell_area(&self) -> f64 {
        self.tech.cell(LogicCell::Mux2).area + self.tech.cell(LogicCell::Dff).area
    }

    fn cell_leakage(&self) -> f64 {
        self.tech.cell(LogicCell::Mux2).leakage + self.tech.cell(LogicCell::Dff).leakage
    }
}

/// Sigmoid implemented with an SRAM lookup table indexed by the top input bits.
#[derive(Debug, Clone)]
pub struct Sigmoid {
    num_unit: usize,
    num_ybit: usize,
    num_entry: usize,
    tech: Technology,
}

impl Sigmoid {
    /// Largest table index width; wider inputs are truncated to their top bits.
    const MAX_INDEX_BITS: usize = 10;

    /// Creates `num_unit` tables mapping `num_xbit`-bit sums to `num_ybit`-bit outputs.
    pub fn new(num_unit: usize, num_xbit: usize, num_ybit: usize, tech: Technology) -> Self {
        let index_bits = num_xbit.clamp(1, Self::MAX_INDEX_BITS);
        Self {
            num_unit: num_unit.max(1),
            num_ybit,
            num_entry: 1 << index_bits,
            tech,
        }
    }

    fn table_bits(&self) -> f64 {
        (self.num_entry * self.num_ybit) as f64
    }
}

/// The activation stage of a tile or of the chip.
#[derive(Debug, Clone)]
pub enum ActivationUnit {
    /// Rectifier.
    Relu(BitShifter),
    /// Sigmoid lookup.
    Sigmoid(Sigmoid),
}

impl ActivationUnit {
    /// Creates `num_unit` activation units converting `input_bits`-bit sums into
    /// `output_bits`-bit activations.
    pub fn new(
        kind: ActivationKind,
        num_unit: usize,
        input_bits: usize,
        output_bits: usize,
        tech: Technology,
    ) -> Self {
        match kind {
            ActivationKind::Relu => {
                ActivationUnit::Relu(BitShifter::new(num_unit, output_bits, tech))
            }
            ActivationKind::Sigmoid => {
                ActivationUnit::Sigmoid(Sigmoid::new(num_unit, input_bits, output_bits, tech))
            }
        }
    }

    /// Width of each activation output.
    pub fn output_bits(&self) -> usize {
        match self {
            ActivationUnit::Relu(relu) => relu.num_bit,
            ActivationUnit::Sigmoid(sigmoid) => sigmoid.num_ybit,
        }
    }

    /// Cost of `num_read` passes over all units.
    pub fn calculate(&self, num_read: f64) -> ModuleCost {
        match self {
            ActivationUnit::Relu(relu) => {
                let bits = (relu.num_unit * relu.num_bit) as f64;
                ModuleCost::new(num_read * relu.cell_delay(), num_read * bits * relu.cell_energy())
            }
            ActivationUnit::Sigmoid(sigmoid) => {
                let tech = &sigmoid.tech;
                let index_bits = sigmoid.num_entry.trailing_zeros() as f64;
                let delay = index_bits * tech.cell(LogicCell::Nand2).delay
                    + tech.cell(LogicCell::SramBit).delay;
                let energy = sigmoid.num_unit as f64
                    * (sigmoid.num_ybit as f64 * tech.cell(LogicCell::SramBit).energy
                        + index_bits * tech.cell(LogicCell::Nand2).energy);
                ModuleCost::new(num_read * delay, num_read * energy)
            }
        }
    }

    /// Layout area (m²).
    pub fn area(&self) -> f64 {
        match self {
            ActivationUnit::Relu(relu) => (relu.num_unit * relu.num_bit) as f64 * relu.cell_area(),
            ActivationUnit::Sigmoid(sigmoid) => {
                sigmoid.num_unit as f64
                    * sigmoid.table_bits()
                    * sigmoid.tech.cell(LogicCell::SramBit).area
            }
        }
    }

    /// Leakage power (W).
    pub fn leakage(&self) -> f64 {
        match self {
            ActivationUnit::Relu(relu) => {
                (relu.num_unit * relu.num_bit) as f64 * relu.cell_leakage()
            }
            ActivationUnit::Sigmoid(sigmoid) => {
                sigmoid.num_unit as f64
                    * sigmoid.table_bits()
                    * sigmoid.tech.cell(LogicCell::SramBit).leakage
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbar_config::{DeviceRoadmap, TransistorType};

    fn tech() -> Technology {
        Technology::new(32, TransistorType::Conventional, DeviceRoadmap::Hp, 300.0)
    }

    #[test]
    fn relu_output_width() {
        let unit = ActivationUnit::new(ActivationKind::Relu, 16, 20, 8, tech());
        assert_eq!(unit.output_bits(), 8);
        let cost = unit.calculate(4.0);
        assert!(cost.latency > 0.0 && cost.dynamic_energy > 0.0);
    }

    #[test]
    fn sigmoid_table_is_bounded() {
        let unit = ActivationUnit::new(ActivationKind::Sigmoid, 4, 24, 8, tech());
        assert_eq!(unit.output_bits(), 8);
        match &unit {
            ActivationUnit::Sigmoid(s) => assert_eq!(s.num_entry, 1024),
            other => panic!("expected sigmoid, got {other:?}"),
        }
        assert!(unit.area() > 0.0);
        assert!(unit.leakage() > 0.0);
    }

    #[test]
    fn zero_reads_cost_nothing() {
        let unit = ActivationUnit::new(ActivationKind::Relu, 16, 20, 8, tech());
        assert!(unit.calculate(0.0).is_zero());
    }
}
