//! Process technology table and derived standard-cell costs.

use serde::Serialize;
use xbar_config::{DeviceRoadmap, Params, TransistorType};

/// Electrical parameters of one technology node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Technology {
    /// Node name in nm.
    pub node_nm: u32,
    /// Feature size (m).
    pub feature_size: f64,
    /// Supply voltage (V).
    pub vdd: f64,
    /// Gate capacitance per metre of transistor width (F/m).
    pub cap_gate: f64,
    /// Effective on-resistance times width (Ω·m).
    pub r_on: f64,
    /// Off-current per metre of width (A/m).
    pub i_off: f64,
    /// Wire capacitance per metre (F/m).
    pub wire_cap: f64,
}

/// Standard logic cells the peripheral models are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicCell {
    /// Inverter.
    Inverter,
    /// Two-input NAND.
    Nand2,
    /// Transmission-gate 2:1 mux.
    Mux2,
    /// One-bit full adder.
    FullAdder,
    /// Master-slave flip-flop.
    Dff,
    /// 6T SRAM bit.
    SramBit,
}

impl LogicCell {
    fn transistors(self) -> f64 {
        match self {
            LogicCell::Inverter => 2.0,
            LogicCell::Nand2 => 4.0,
            LogicCell::Mux2 => 4.0,
            LogicCell::FullAdder => 28.0,
            LogicCell::Dff => 20.0,
            LogicCell::SramBit => 6.0,
        }
    }

    /// Logical depth in FO4 delays.
    fn depth(self) -> f64 {
        match self {
            LogicCell::Inverter => 1.0,
            LogicCell::Nand2 => 1.3,
            LogicCell::Mux2 => 1.0,
            LogicCell::FullAdder => 2.0,
            LogicCell::Dff => 3.0,
            LogicCell::SramBit => 2.0,
        }
    }
}

/// Cost of one standard cell at a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StdCell {
    /// Propagation delay (s).
    pub delay: f64,
    /// Switching energy per operation (J).
    pub energy: f64,
    /// Layout area (m²).
    pub area: f64,
    /// Leakage power (W).
    pub leakage: f64,
}

/// Average transistor width in feature sizes.
const AVG_WIDTH_F: f64 = 2.0;

/// Layout area of one transistor in F².
const TRANSISTOR_AREA_F2: f64 = 20.0;

/// (vdd, gate cap F/m, on-resistance Ω·m, off-current A/m) of high-performance devices.
fn node_table(node_nm: u32) -> (f64, f64, f64, f64) {
    match node_nm {
        130 => (1.3, 1.20e-9, 2.4e-3, 2.0e-2),
        90 => (1.2, 1.10e-9, 2.0e-3, 5.0e-2),
        65 => (1.1, 1.00e-9, 1.7e-3, 1.0e-1),
        45 => (1.0, 0.95e-9, 1.5e-3, 1.5e-1),
        32 => (0.9, 0.90e-9, 1.3e-3, 2.0e-1),
        22 => (0.85, 0.85e-9, 1.2e-3, 2.5e-1),
        14 => (0.8, 0.80e-9, 1.1e-3, 3.0e-1),
        10 => (0.75, 0.75e-9, 1.0e-3, 3.0e-1),
        // 7 nm; other nodes are rejected during parameter resolution
        _ => (0.7, 0.70e-9, 0.9e-3, 3.0e-1),
    }
}

impl Technology {
    /// Builds the technology for a node, device family, roadmap and temperature (K).
    pub fn new(
        node_nm: u32,
        transistor: TransistorType,
        roadmap: DeviceRoadmap,
        temperature: f64,
    ) -> Self {
        let (mut vdd, cap_gate, mut r_on, mut i_off) = node_table(node_nm);
        if roadmap == DeviceRoadmap::Lstp {
            vdd += 0.1;
            r_on *= 2.0;
            i_off /= 1000.0;
        }
        match transistor {
            TransistorType::Conventional => {}
            TransistorType::Fet2d => i_off /= 10.0,
            TransistorType::Tfet => {
                vdd *= 0.6;
                r_on *= 3.0;
                i_off /= 100.0;
            }
        }
        // subthreshold leakage doubles roughly every 20 K
        i_off *= 2f64.powf((temperature - 300.0) / 20.0);

        Self {
            node_nm,
            feature_size: node_nm as f64 * 1e-9,
            vdd,
            cap_gate,
            r_on,
            i_off,
            wire_cap: 0.2e-9,
        }
    }

    /// Builds the technology described by a parameter store.
    pub fn from_params(params: &Params) -> Self {
        let tech = &params.technology;
        Self::new(tech.node, tech.transistor, tech.roadmap, tech.temperature)
    }

    /// Fan-out-of-four inverter delay (s).
    pub fn fo4_delay(&self) -> f64 {
        0.69 * self.r_on * self.cap_gate * 4.0
    }

    /// Energy to switch a gate of the given width (in F) once (J).
    pub fn gate_energy(&self, width_f: f64) -> f64 {
        self.cap_gate * width_f * self.feature_size * self.vdd * self.vdd
    }

    /// Leakage power of a transistor of the given width (in F) (W).
    pub fn leakage_power(&self, width_f: f64) -> f64 {
        self.i_off * width_f * self.feature_size * self.vdd
    }

    /// Area of one transistor (m²).
    pub fn transistor_area(&self) -> f64 {
        TRANSISTOR_AREA_F2 * self.feature_size * self.feature_size
    }

    /// On-resistance of a transistor of the given width (in F) (Ω).
    pub fn on_resistance(&self, width_f: f64) -> f64 {
        self.r_on / (width_f * self.feature_size)
    }

    /// Cost of one standard cell.
    pub fn cell(&self, kind: LogicCell) -> StdCell {
        let n = kind.transistors();
        StdCell {
            delay: kind.depth() * self.fo4_delay(),
            // roughly half the transistors switch per operation
            energy: 0.5 * n * self.gate_energy(AVG_WIDTH_F),
            area: n * self.transistor_area(),
            leakage: 0.5 * n * self.leakage_power(AVG_WIDTH_F),
        }
    }

    /// Delay of a wire of the given length, repeated when that is faster (s).
    pub fn wire_delay(&self, length: f64, unit_resistance: f64) -> f64 {
        let rc = unit_resistance * self.wire_cap;
        let unrepeated = 0.38 * rc * length * length + self.fo4_delay();
        let repeated = 2.5 * length * (rc * self.fo4_delay()).sqrt();
        unrepeated.min(repeated.max(self.fo4_delay()))
    }

    /// Energy to swing a wire of the given length once (J).
    pub fn wire_energy(&self, length: f64) -> f64 {
        self.wire_cap * length * self.vdd * self.vdd
    }
}
