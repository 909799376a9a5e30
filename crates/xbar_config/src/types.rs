//! Parameter types deserialized from `xbar.toml`.
//!
//! Every section is optional; omitted values take the reference defaults
//! (RRAM with a CMOS access transistor at 32 nm, 128×128 subarrays, 1 GHz).

use serde::{Deserialize, Serialize};

/// The top-level parameter file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ParamConfig {
    /// Synaptic memory cell.
    pub cell: CellConfig,
    /// Subarray geometry and read-out.
    pub subarray: SubArrayConfig,
    /// Process technology and interconnect.
    pub technology: TechnologyConfig,
    /// Chip-level organisation.
    pub chip: ChipConfig,
}

/// The synaptic memory cell, tagged by `type`.
///
/// ```toml
/// [cell]
/// type = "rram"
/// resistance_on = 100e3
/// access = { type = "cmos", resistance = 15e3 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellConfig {
    /// 6T/8T SRAM bit cell; always one bit per cell.
    Sram(SramCell),
    /// Resistive RAM.
    Rram(NvmCell),
    /// Ferroelectric FET; the channel is its own access device.
    Fefet(NvmCell),
}

impl Default for CellConfig {
    fn default() -> Self {
        CellConfig::Rram(NvmCell::default())
    }
}

impl CellConfig {
    /// Returns `true` for the SRAM cell.
    pub fn is_sram(&self) -> bool {
        matches!(self, CellConfig::Sram(_))
    }

    /// Returns the non-volatile cell parameters, if this is not SRAM.
    pub fn nvm(&self) -> Option<&NvmCell> {
        match self {
            CellConfig::Sram(_) => None,
            CellConfig::Rram(cell) | CellConfig::Fefet(cell) => Some(cell),
        }
    }

    /// Cell footprint `(height, width)` in units of the feature size.
    pub fn footprint(&self) -> (f64, f64) {
        match self {
            CellConfig::Sram(_) => (7.69, 23.23),
            CellConfig::Rram(cell) | CellConfig::Fefet(cell) => match cell.access {
                AccessDevice::Cmos { .. } => (4.0, 4.0),
                _ => (2.0, 2.0),
            },
        }
    }
}

/// SRAM bit-cell transistor widths (in feature sizes).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SramCell {
    /// Pull-down NMOS width.
    pub width_nmos: f64,
    /// Pull-up PMOS width.
    pub width_pmos: f64,
    /// Access transistor width.
    pub width_access: f64,
    /// Minimum bitline swing the sense amplifier resolves (V).
    pub min_sense_voltage: f64,
}

impl Default for SramCell {
    fn default() -> Self {
        Self {
            width_nmos: 2.08,
            width_pmos: 1.23,
            width_access: 1.31,
            min_sense_voltage: 0.1,
        }
    }
}

/// Non-volatile (RRAM/FeFET) cell electrical parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NvmCell {
    /// Low-resistance state (Ω).
    pub resistance_on: f64,
    /// High-resistance state (Ω).
    pub resistance_off: f64,
    /// Read voltage (V).
    pub read_voltage: f64,
    /// Read pulse width (s).
    pub read_pulse_width: f64,
    /// Access device in series with the cell.
    pub access: AccessDevice,
}

impl Default for NvmCell {
    fn default() -> Self {
        Self {
            resistance_on: 100e3,
            resistance_off: 10e6,
            read_voltage: 0.5,
            read_pulse_width: 10e-9,
            access: AccessDevice::default(),
        }
    }
}

/// The access device of a non-volatile cell, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccessDevice {
    /// 1T1R with a CMOS access transistor.
    Cmos {
        /// On-resistance of the access transistor (Ω).
        #[serde(default = "default_access_resistance")]
        resistance: f64,
        /// Gate voltage of the access transistor (V).
        #[serde(default = "default_access_voltage")]
        gate_voltage: f64,
    },
    /// Bipolar selector.
    Bjt,
    /// Diode selector.
    Diode,
    /// Pure crossbar without selector.
    None,
}

fn default_access_resistance() -> f64 {
    15e3
}

fn default_access_voltage() -> f64 {
    0.1
}

impl Default for AccessDevice {
    fn default() -> Self {
        AccessDevice::Cmos {
            resistance: default_access_resistance(),
            gate_voltage: default_access_voltage(),
        }
    }
}

/// How the rows of a subarray are activated during a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// All activated rows drive the bitline at once; a multi-level ADC resolves the sum.
    #[default]
    Parallel,
    /// Rows are read one at a time and accumulated digitally.
    Sequential,
}

/// Subarray geometry and read-out configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SubArrayConfig {
    /// Rows per subarray.
    pub rows: usize,
    /// Columns per subarray.
    pub cols: usize,
    /// Columns sharing one ADC.
    pub num_col_muxed: usize,
    /// ADC output levels under parallel read.
    pub level_output: usize,
    /// Bits stored per cell.
    pub cell_bit: u32,
    /// Row activation mode.
    pub mode: ReadMode,
}

impl Default for SubArrayConfig {
    fn default() -> Self {
        Self {
            rows: 128,
            cols: 128,
            num_col_muxed: 8,
            level_output: 16,
            cell_bit: 2,
            mode: ReadMode::Parallel,
        }
    }
}

/// Transistor device family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransistorType {
    /// Bulk or FinFET CMOS.
    #[default]
    Conventional,
    /// 2D-material channel FET.
    Fet2d,
    /// Tunnel FET.
    Tfet,
}

/// Device roadmap flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRoadmap {
    /// High performance.
    #[default]
    Hp,
    /// Low standby power.
    Lstp,
}

/// Process technology and interconnect.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TechnologyConfig {
    /// Technology node in nm.
    pub node: u32,
    /// Transistor family.
    pub transistor: TransistorType,
    /// Roadmap flavour.
    pub roadmap: DeviceRoadmap,
    /// Operating temperature (K).
    pub temperature: f64,
    /// Metal wire width in nm.
    pub wire_width: u32,
    /// Treat all array wires as ideal conductors.
    pub ignore_wire_resistance: bool,
}

impl Default for TechnologyConfig {
    fn default() -> Self {
        Self {
            node: 32,
            transistor: TransistorType::Conventional,
            roadmap: DeviceRoadmap::Hp,
            temperature: 301.0,
            wire_width: 40,
            ignore_wire_resistance: false,
        }
    }
}

/// Non-linear activation implemented after accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    /// Rectifier implemented with a bit shifter.
    #[default]
    Relu,
    /// Sigmoid implemented with a lookup table.
    Sigmoid,
}

/// Technology of the tile and global buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    /// SRAM macro.
    #[default]
    Sram,
    /// Flip-flop register file.
    RegisterFile,
}

/// Chip-level organisation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChipConfig {
    /// Clock frequency, e.g. `"1GHz"`.
    pub clock: String,
    /// Apply the activation once at chip level instead of inside every tile.
    pub chip_activation: bool,
    /// Activation function.
    pub activation: ActivationKind,
    /// Enable novel (kernel-position row-sliced) mapping for eligible layers.
    pub novel_mapping: bool,
    /// Buffer technology.
    pub buffer: BufferKind,
    /// Delay tolerance of the intra-tile H-tree.
    pub local_bus_delay_tolerance: f64,
    /// Delay tolerance of the global H-tree.
    pub global_bus_delay_tolerance: f64,
    /// Folding ratio of the H-tree.
    pub tree_folded_ratio: usize,
    /// Upper bound on the global bus width (bits).
    pub max_global_bus_width: usize,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            clock: "1GHz".to_string(),
            chip_activation: true,
            activation: ActivationKind::Relu,
            novel_mapping: false,
            buffer: BufferKind::Sram,
            local_bus_delay_tolerance: 0.1,
            global_bus_delay_tolerance: 0.5,
            tree_folded_ratio: 4,
            max_global_bus_width: 2048,
        }
    }
}
