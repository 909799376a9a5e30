//! H-tree interconnect distributing data to a square grid of units.

use crate::cost::ModuleCost;
use crate::technology::{LogicCell, Technology};
use xbar_common::log2_ceil;

/// An H-tree of `bus_width` wires over a `num_row × num_col` unit grid.
#[derive(Debug, Clone)]
pub struct HTree {
    num_row: usize,
    num_col: usize,
    delay_tolerance: f64,
    bus_width: usize,
    unit_wire_resistance: f64,
    tech: Technology,
}

impl HTree {
    /// Creates an H-tree.
    pub fn new(
        num_row: usize,
        num_col: usize,
        delay_tolerance: f64,
        bus_width: usize,
        unit_wire_resistance: f64,
        tech: Technology,
    ) -> Self {
        Self {
            num_row: num_row.max(1),
            num_col: num_col.max(1),
            delay_tolerance,
            bus_width: bus_width.max(1),
            unit_wire_resistance,
            tech,
        }
    }

    /// Wires in the tree trunk.
    pub fn bus_width(&self) -> usize {
        self.bus_width
    }

    fn levels(&self) -> u32 {
        log2_ceil(self.num_row.max(self.num_col))
    }

    /// Root-to-leaf wire length (m).
    fn path_length(&self, unit_height: f64, unit_width: f64) -> f64 {
        0.5 * (self.num_col as f64 * unit_width + self.num_row as f64 * unit_height)
    }

    fn transfer(&self, length: f64, num_read: f64) -> ModuleCost {
        let relax = 1.0 + self.delay_tolerance;
        let delay = self.tech.wire_delay(length, self.unit_wire_resistance) * relax;
        let energy = self.bus_width as f64 * self.tech.wire_energy(length) / relax;
        ModuleCost::new(num_read * delay, num_read * energy)
    }

    /// Cost of `num_read` root-to-leaf transfers over units of the given size.
    pub fn calculate(&self, unit_height: f64, unit_width: f64, num_read: f64) -> ModuleCost {
        if self.levels() == 0 {
            return ModuleCost::ZERO;
        }
        self.transfer(self.path_length(unit_height, unit_width), num_read)
    }

    /// Cost of `num_read` transfers between adjacent leaves.
    pub fn calculate_neighbor(
        &self,
        unit_height: f64,
        unit_width: f64,
        num_read: f64,
    ) -> ModuleCost {
        if self.levels() == 0 {
            return ModuleCost::ZERO;
        }
        self.transfer(unit_height.max(unit_width), num_read)
    }

    /// Total wire length of all levels (m).
    fn total_length(&self, unit_height: f64, unit_width: f64) -> f64 {
        self.levels() as f64 * self.path_length(unit_height, unit_width)
    }

    /// Wiring area (m²) over units of the given size.
    pub fn area(&self, unit_height: f64, unit_width: f64) -> f64 {
        self.bus_width as f64
            * 2.0
            * self.tech.feature_size
            * self.total_length(unit_height, unit_width)
    }

    /// Repeater leakage (W).
    pub fn leakage(&self) -> f64 {
        self.levels() as f64 * self.bus_width as f64 * self.tech.cell(LogicCell::Inverter).leakage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbar_config::{DeviceRoadmap, TransistorType};

    fn tree(n: usize) -> HTree {
        let tech = Technology::new(32, TransistorType::Conventional, DeviceRoadmap::Hp, 300.0);
        HTree::new(n, n, 0.1, 256, 1.3e7, tech)
    }

    #[test]
    fn single_leaf_tree_is_free() {
        let t = tree(1);
        assert!(t.calculate(50e-6, 50e-6, 100.0).is_zero());
        assert_eq!(t.area(50e-6, 50e-6), 0.0);
    }

    #[test]
    fn neighbor_hop_is_cheaper_than_full_path() {
        let t = tree(4);
        let full = t.calculate(50e-6, 50e-6, 100.0);
        let hop = t.calculate_neighbor(50e-6, 50e-6, 100.0);
        assert!(hop.dynamic_energy < full.dynamic_energy);
        assert!(hop.latency <= full.latency);
    }

    #[test]
    fn bigger_grid_costs_more() {
        let wide = tree(8).calculate(50e-6, 50e-6, 1.0);
        assert!(wide.latency > tree(2).calculate(50e-6, 50e-6, 1.0).latency);
        assert!(tree(8).area(50e-6, 50e-6) > tree(2).area(50e-6, 50e-6));
        assert!(tree(8).leakage() > 0.0);
    }
}
