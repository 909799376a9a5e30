//! Point-to-point buses inside a processing element.

use crate::cost::ModuleCost;
use crate::technology::{LogicCell, Technology};

/// Direction a bus runs across a grid of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOrientation {
    /// Spans the columns of the grid.
    Horizontal,
    /// Spans the rows of the grid.
    Vertical,
}

/// A repeated bus of `bus_width` wires per row (or column) of a unit grid.
#[derive(Debug, Clone)]
pub struct Bus {
    orientation: BusOrientation,
    num_row: usize,
    num_col: usize,
    bus_width: usize,
    length: f64,
    delay_tolerance: f64,
    unit_wire_resistance: f64,
    tech: Technology,
}

impl Bus {
    /// Creates a bus over a `num_row × num_col` grid of `unit_height × unit_width` units.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orientation: BusOrientation,
        num_row: usize,
        num_col: usize,
        delay_tolerance: f64,
        bus_width: usize,
        unit_height: f64,
        unit_width: f64,
        unit_wire_resistance: f64,
        tech: Technology,
    ) -> Self {
        let length = match orientation {
            BusOrientation::Horizontal => num_col as f64 * unit_width,
            BusOrientation::Vertical => num_row as f64 * unit_height,
        };
        Self {
            orientation,
            num_row: num_row.max(1),
            num_col: num_col.max(1),
            bus_width: bus_width.max(1),
            length,
            delay_tolerance,
            unit_wire_resistance,
            tech,
        }
    }

    /// Wires per lane.
    pub fn bus_width(&self) -> usize {
        self.bus_width
    }

    /// Number of parallel lanes.
    pub fn num_lanes(&self) -> usize {
        match self.orientation {
            BusOrientation::Horizontal => self.num_row,
            BusOrientation::Vertical => self.num_col,
        }
    }

    /// Latency of `num_read` transfers.
    pub fn calculate_latency(&self, num_read: f64) -> f64 {
        num_read
            * self.tech.wire_delay(self.length, self.unit_wire_resistance)
            * (1.0 + self.delay_tolerance)
    }

    /// Energy of `num_read` transfers of `num_bit_access` bits.
    pub fn calculate_energy(&self, num_bit_access: f64, num_read: f64) -> f64 {
        // relaxed repeaters trade delay for switching energy
        num_bit_access * num_read * self.tech.wire_energy(self.length)
            / (1.0 + self.delay_tolerance)
    }

    /// Latency and energy of `num_read` full-width transfers.
    pub fn calculate(&self, num_read: f64) -> ModuleCost {
        let bits = (self.bus_width * self.num_lanes()) as f64;
        ModuleCost::new(self.calculate_latency(num_read), self.calculate_energy(bits, num_read))
    }

    /// Wiring area (m²), at a pitch of two feature sizes per wire.
    pub fn area(&self) -> f64 {
        (self.bus_width * self.num_lanes()) as f64 * 2.0 * self.tech.feature_size * self.length
    }

    /// Repeater leakage (W).
    pub fn leakage(&self) -> f64 {
        (self.bus_width * self.num_lanes()) as f64 * self.tech.cell(LogicCell::Inverter).leakage
    }
}
