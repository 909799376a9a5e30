//! Resolution of a parsed parameter file into the immutable [`Params`] store.
//!
//! Resolution applies the run's precision, derives secondary quantities (columns
//! per synapse, conductance bounds, wire resistance) and auto-corrects
//! inconsistent values, emitting one diagnostic per correction.

use crate::error::ConfigError;
use crate::types::{
    AccessDevice, ActivationKind, BufferKind, CellConfig, ParamConfig, ReadMode,
    TechnologyConfig,
};
use serde::Serialize;
use xbar_common::{ceil_div, Frequency};
use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// Technology nodes the circuit models carry data for.
pub const SUPPORTED_NODES: [u32; 9] = [130, 90, 65, 45, 32, 22, 14, 10, 7];

/// Widest supported weight or input precision.
pub const MAX_PRECISION_BITS: u32 = 32;

/// Operand precision of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Precision {
    /// Bits per synaptic weight.
    pub synapse_bit: u32,
    /// Bits per input activation; inputs are streamed one bit per cycle.
    pub input_bit: u32,
}

impl Precision {
    /// Creates a precision pair.
    pub fn new(synapse_bit: u32, input_bit: u32) -> Self {
        Self {
            synapse_bit,
            input_bit,
        }
    }
}

/// Array wire resistances derived from the wire width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WireResistance {
    /// Resistance per metre of wire (Ω/m).
    pub unit_length: f64,
    /// Row wire resistance across one cell (Ω).
    pub row: f64,
    /// Column wire resistance across one cell (Ω).
    pub col: f64,
}

/// The resolved, read-only parameter store.
#[derive(Debug, Clone, Serialize)]
pub struct Params {
    /// Synaptic memory cell.
    pub cell: CellConfig,
    /// Process technology.
    pub technology: TechnologyConfig,
    /// Clock frequency.
    pub clock: Frequency,
    /// Rows per subarray.
    pub num_row_subarray: usize,
    /// Columns per subarray.
    pub num_col_subarray: usize,
    /// Columns sharing one ADC, never above `num_col_subarray`.
    pub num_col_muxed: usize,
    /// ADC output levels under parallel read.
    pub level_output: usize,
    /// Bits per cell, never above `synapse_bit`.
    pub cell_bit: u32,
    /// Bits per synaptic weight.
    pub synapse_bit: u32,
    /// Bits per input activation.
    pub input_bit: u32,
    /// `ceil(synapse_bit / cell_bit)`.
    pub num_col_per_synapse: usize,
    /// Rows per synapse; always one.
    pub num_row_per_synapse: usize,
    /// Whether rows are read in parallel.
    pub parallel_read: bool,
    /// Array wire resistances.
    pub wire: WireResistance,
    /// `1 / resistance_on` (S).
    pub max_conductance: f64,
    /// `1 / resistance_off` (S).
    pub min_conductance: f64,
    /// Activation applied once at chip level.
    pub chip_activation: bool,
    /// Activation function.
    pub activation: ActivationKind,
    /// Novel mapping enabled.
    pub novel_mapping: bool,
    /// Buffer technology.
    pub buffer: BufferKind,
    /// Intra-tile H-tree delay tolerance.
    pub local_bus_delay_tolerance: f64,
    /// Global H-tree delay tolerance.
    pub global_bus_delay_tolerance: f64,
    /// H-tree folding ratio.
    pub tree_folded_ratio: usize,
    /// Global bus width bound (bits).
    pub max_global_bus_width: usize,
}

impl Params {
    /// ADC output levels actually resolved per read.
    ///
    /// Parallel read uses the configured level count; sequential read resolves
    /// one cell at a time, i.e. `2^cell_bit` levels.
    pub fn effective_level_output(&self) -> usize {
        if self.parallel_read {
            self.level_output
        } else {
            1 << self.cell_bit
        }
    }

    /// Series resistance of the access device, when it is a CMOS transistor on RRAM.
    pub fn access_resistance(&self) -> Option<f64> {
        match &self.cell {
            CellConfig::Rram(cell) => match cell.access {
                AccessDevice::Cmos { resistance, .. } => Some(resistance),
                _ => None,
            },
            _ => None,
        }
    }

    /// Feature size in metres.
    pub fn feature_size(&self) -> f64 {
        self.technology.node as f64 * 1e-9
    }
}

/// Resolves a parsed parameter file for the given precision.
///
/// Corrections are reported as `C0xx` diagnostics; unsupported discrete
/// values are returned as errors.
pub fn resolve_params(
    config: &ParamConfig,
    precision: Precision,
    sink: &DiagnosticSink,
) -> Result<Params, ConfigError> {
    let bit_range = 1..=MAX_PRECISION_BITS;
    if !bit_range.contains(&precision.synapse_bit) || !bit_range.contains(&precision.input_bit) {
        return Err(ConfigError::ValidationError(format!(
            "synapse and input precision must be between 1 and {MAX_PRECISION_BITS} bits"
        )));
    }
    if !SUPPORTED_NODES.contains(&config.technology.node) {
        return Err(ConfigError::Unsupported {
            what: "technology node",
            value: format!("{}nm", config.technology.node),
        });
    }
    let clock: Frequency = config
        .chip
        .clock
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("chip.clock: {e}")))?;

    let sub = &config.subarray;
    let mut cell_bit = sub.cell_bit;
    if config.cell.is_sram() && cell_bit != 1 {
        sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Config, 5),
                "SRAM cells store one bit",
            )
            .with_context("memory cell")
            .with_note(format!("cell_bit corrected from {cell_bit} to 1")),
        );
        cell_bit = 1;
    }
    if cell_bit > precision.synapse_bit {
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::new(Category::Config, 1),
                "cell precision exceeds synapse precision",
            )
            .with_context("memory cell")
            .with_note(format!(
                "cell_bit corrected from {cell_bit} to {}",
                precision.synapse_bit
            ))
            .with_help("lower subarray.cell_bit or raise the weight precision"),
        );
        cell_bit = precision.synapse_bit;
    }

    let mut num_col_muxed = sub.num_col_muxed;
    if num_col_muxed > sub.cols {
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::new(Category::Config, 2),
                "num_col_muxed exceeds subarray columns",
            )
            .with_context("subarray")
            .with_note(format!("clamped from {num_col_muxed} to {}", sub.cols)),
        );
        num_col_muxed = sub.cols;
    }

    let parallel_read = sub.mode == ReadMode::Parallel;
    if !parallel_read && sub.level_output != 1 << cell_bit {
        sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Config, 3),
                "level_output is ignored under sequential read",
            )
            .with_context("subarray")
            .with_note(format!("the ADC resolves {} levels per cell", 1u32 << cell_bit)),
        );
    }

    let wire = wire_resistance(&config.cell, &config.technology, sink)?;

    let (max_conductance, min_conductance) = match config.cell.nvm() {
        Some(cell) => (1.0 / cell.resistance_on, 1.0 / cell.resistance_off),
        None => (1.0, 0.0),
    };

    Ok(Params {
        cell: config.cell.clone(),
        technology: config.technology.clone(),
        clock,
        num_row_subarray: sub.rows,
        num_col_subarray: sub.cols,
        num_col_muxed,
        level_output: sub.level_output,
        cell_bit,
        synapse_bit: precision.synapse_bit,
        input_bit: precision.input_bit,
        num_col_per_synapse: ceil_div(precision.synapse_bit as usize, cell_bit as usize),
        num_row_per_synapse: 1,
        parallel_read,
        wire,
        max_conductance,
        min_conductance,
        chip_activation: config.chip.chip_activation,
        activation: config.chip.activation,
        novel_mapping: config.chip.novel_mapping,
        buffer: config.chip.buffer,
        local_bus_delay_tolerance: config.chip.local_bus_delay_tolerance,
        global_bus_delay_tolerance: config.chip.global_bus_delay_tolerance,
        tree_folded_ratio: config.chip.tree_folded_ratio,
        max_global_bus_width: config.chip.max_global_bus_width,
    })
}

/// Aspect ratio and resistivity (Ω·m) of a metal wire of the given width.
fn wire_table(width_nm: u32) -> Option<(f64, f64)> {
    match width_nm {
        200 => Some((2.10, 2.42e-8)),
        100 => Some((2.30, 2.73e-8)),
        50 => Some((2.34, 3.91e-8)),
        40 => Some((1.90, 4.03e-8)),
        32 => Some((1.90, 4.51e-8)),
        22 => Some((2.00, 5.41e-8)),
        14 => Some((2.10, 7.43e-8)),
        _ => None,
    }
}

fn wire_resistance(
    cell: &CellConfig,
    technology: &TechnologyConfig,
    sink: &DiagnosticSink,
) -> Result<WireResistance, ConfigError> {
    if technology.ignore_wire_resistance {
        sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Config, 4),
                "array wire resistance ignored",
            )
            .with_context("technology"),
        );
        return Ok(WireResistance {
            unit_length: 1.0,
            row: 0.0,
            col: 0.0,
        });
    }
    let width = technology.wire_width;
    let (aspect_ratio, resistivity) = wire_table(width).ok_or(ConfigError::Unsupported {
        what: "wire width",
        value: format!("{width}nm"),
    })?;
    let width_m = width as f64 * 1e-9;
    let unit_length = resistivity / (width_m * width_m * aspect_ratio);
    let (height_f, width_f) = cell.footprint();
    Ok(WireResistance {
        unit_length,
        row: unit_length * width_m * height_f,
        col: unit_length * width_m * width_f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;
    use xbar_diagnostics::Severity;

    fn resolve(toml: &str, precision: Precision) -> (Result<Params, ConfigError>, DiagnosticSink) {
        let sink = DiagnosticSink::new();
        let config = load_config_from_str(toml).unwrap();
        let params = resolve_params(&config, precision, &sink);
        (params, sink)
    }

    #[test]
    fn defaults_resolve_cleanly() {
        let (params, sink) = resolve("", Precision::new(8, 8));
        let params = params.unwrap();
        assert!(sink.diagnostics().is_empty());
        assert_eq!(params.num_col_per_synapse, 4);
        assert_eq!(params.num_row_per_synapse, 1);
        assert!(params.parallel_read);
        assert_eq!(params.effective_level_output(), 16);
        assert_eq!(params.access_resistance(), Some(15e3));
        assert!((params.max_conductance - 1e-5).abs() < 1e-15);
        assert!((params.min_conductance - 1e-7).abs() < 1e-17);
        assert_eq!(params.clock.hz(), 1e9);
    }

    #[test]
    fn wire_resistance_from_table() {
        let (params, _) = resolve("", Precision::new(8, 8));
        let wire = params.unwrap().wire;
        let expected_unit = 4.03e-8 / (40e-9 * 40e-9 * 1.90);
        assert!((wire.unit_length - expected_unit).abs() / expected_unit < 1e-12);
        assert!((wire.row - expected_unit * 40e-9 * 4.0).abs() < 1e-9);
        assert!(wire.row > 0.0 && wire.col > 0.0);
    }

    #[test]
    fn cell_precision_above_synapse_is_corrected() {
        let (params, sink) = resolve("[subarray]\ncell_bit = 4\n", Precision::new(2, 8));
        let params = params.unwrap();
        assert_eq!(params.cell_bit, 2);
        assert_eq!(params.num_col_per_synapse, 1);
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(format!("{}", diags[0].code), "C001");
    }

    #[test]
    fn mux_above_columns_is_clamped() {
        let (params, sink) = resolve(
            "[subarray]\nrows = 64\ncols = 64\nnum_col_muxed = 128\n",
            Precision::new(8, 8),
        );
        assert_eq!(params.unwrap().num_col_muxed, 64);
        assert_eq!(format!("{}", sink.diagnostics()[0].code), "C002");
    }

    #[test]
    fn sram_forces_single_bit_cells() {
        let (params, sink) = resolve("[cell]\ntype = \"sram\"\n", Precision::new(8, 8));
        let params = params.unwrap();
        assert_eq!(params.cell_bit, 1);
        assert_eq!(params.num_col_per_synapse, 8);
        assert_eq!(params.access_resistance(), None);
        assert_eq!(format!("{}", sink.diagnostics()[0].code), "C005");
    }

    #[test]
    fn sequential_read_uses_cell_levels() {
        let (params, sink) = resolve("[subarray]\nmode = \"sequential\"\n", Precision::new(8, 8));
        let params = params.unwrap();
        assert!(!params.parallel_read);
        assert_eq!(params.effective_level_output(), 4);
        assert_eq!(format!("{}", sink.diagnostics()[0].code), "C003");
    }

    #[test]
    fn ignored_wires_have_zero_resistance() {
        let (params, sink) = resolve(
            "[technology]\nignore_wire_resistance = true\n",
            Precision::new(8, 8),
        );
        let wire = params.unwrap().wire;
        assert_eq!(wire.row, 0.0);
        assert_eq!(wire.col, 0.0);
        assert_eq!(wire.unit_length, 1.0);
        assert_eq!(sink.diagnostics()[0].severity, Severity::Note);
    }

    #[test]
    fn unsupported_wire_width_is_fatal() {
        let (params, _) = resolve("[technology]\nwire_width = 45\n", Precision::new(8, 8));
        assert!(matches!(
            params.unwrap_err(),
            ConfigError::Unsupported { what: "wire width", .. }
        ));
    }

    #[test]
    fn unsupported_node_is_fatal() {
        let (params, _) = resolve("[technology]\nnode = 28\n", Precision::new(8, 8));
        assert!(matches!(
            params.unwrap_err(),
            ConfigError::Unsupported { what: "technology node", .. }
        ));
    }

    #[test]
    fn bad_clock_is_validation_error() {
        let (params, _) = resolve("[chip]\nclock = \"fast\"\n", Precision::new(8, 8));
        assert!(matches!(params.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn precision_out_of_range_rejected() {
        let (params, _) = resolve("", Precision::new(0, 8));
        assert!(params.is_err());
        let (params, _) = resolve("", Precision::new(8, 40));
        assert!(params.is_err());
    }
}
