//! Analytic model of one crossbar subarray with its read-out periphery.
//!
//! The array is read `num_col_muxed` times per input vector, one column group
//! per read. Each read drives the wordlines, lets the bitlines settle, converts
//! with a multi-level sense amplifier (the ADC) and shifts-and-adds the result.

use crate::cost::{AreaBreakdown, SubArrayCost};
use crate::technology::{LogicCell, Technology};
use crate::SubArrayModel;
use xbar_common::{ceil_div, log2_ceil};
use xbar_config::{CellConfig, Params};

/// ADC area per resolved bit, in F².
const ADC_AREA_PER_BIT_F2: f64 = 400.0;

/// Junction capacitance a cell adds to its bitline, in gate-widths of F.
const CELL_BITLINE_LOAD_F: f64 = 1.0;

/// Read-out style of the array cells.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellReadout {
    /// Current sensing for the duration of a fixed read pulse.
    Resistive {
        read_voltage: f64,
        read_pulse_width: f64,
    },
    /// Bitline discharge until the sense margin is reached.
    Sram { min_sense_voltage: f64 },
}

/// Analytic crossbar subarray.
#[derive(Debug, Clone)]
pub struct CrossbarSubArray {
    rows: usize,
    cols: usize,
    num_col_muxed: usize,
    level_output: usize,
    parallel_read: bool,
    input_bit: u32,
    cell_height: f64,
    cell_width: f64,
    readout: CellReadout,
    unit_wire_resistance: f64,
    tech: Technology,
}

impl CrossbarSubArray {
    /// Creates the subarray described by `params` at technology `tech`.
    pub fn new(params: &Params, tech: Technology) -> Self {
        let (height_f, width_f) = params.cell.footprint();
        let readout = match &params.cell {
            CellConfig::Sram(cell) => CellReadout::Sram {
                min_sense_voltage: cell.min_sense_voltage,
            },
            CellConfig::Rram(cell) | CellConfig::Fefet(cell) => CellReadout::Resistive {
                read_voltage: cell.read_voltage,
                read_pulse_width: cell.read_pulse_width,
            },
        };
        Self {
            rows: params.num_row_subarray,
            cols: params.num_col_subarray,
            num_col_muxed: params.num_col_muxed.clamp(1, params.num_col_subarray),
            level_output: params.effective_level_output(),
            parallel_read: params.parallel_read,
            input_bit: params.input_bit,
            cell_height: height_f * tech.feature_size,
            cell_width: width_f * tech.feature_size,
            readout,
            unit_wire_resistance: params.wire.unit_length,
            tech,
        }
    }

    fn num_adc(&self) -> usize {
        ceil_div(self.cols, self.num_col_muxed)
    }

    fn shift_add_bits(&self, adc_bits: u32) -> f64 {
        (adc_bits + self.input_bit) as f64
    }

    fn bitline_cap(&self) -> f64 {
        let length = self.rows as f64 * self.cell_height;
        self.tech.wire_cap * length
            + self.rows as f64 * self.tech.cap_gate * CELL_BITLINE_LOAD_F * self.tech.feature_size
    }

    fn wordline_length(&self) -> f64 {
        self.cols as f64 * self.cell_width
    }

    /// Bitline settle time for a column of the given effective resistance.
    fn settle_time(&self, resistance: f64) -> f64 {
        let tau = resistance * self.bitline_cap();
        match self.readout {
            CellReadout::Resistive {
                read_pulse_width, ..
            } => read_pulse_width.max(0.69 * tau),
            CellReadout::Sram { min_sense_voltage } => tau * min_sense_voltage / self.tech.vdd,
        }
    }
}

impl SubArrayModel for CrossbarSubArray {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn calculate(
        &self,
        column_resistance: &[f64],
        activity_row_read: f64,
        level_output: usize,
    ) -> SubArrayCost {
        let tech = &self.tech;
        let fo4 = tech.fo4_delay();
        let adc_bits = log2_ceil(level_output.max(2));
        let activated_rows = (activity_row_read * self.rows as f64).round().max(0.0);

        // Sequential read senses one wordline at a time.
        let row_reads = if self.parallel_read {
            1.0
        } else {
            activated_rows.max(1.0)
        };
        let reads = self.num_col_muxed as f64 * row_reads;

        // Harmonic mean of the column resistances sets the typical settle time.
        let finite: Vec<f64> = column_resistance
            .iter()
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .collect();
        let mean_conductance = if finite.is_empty() {
            0.0
        } else {
            finite.iter().map(|r| 1.0 / r).sum::<f64>() / finite.len() as f64
        };
        let typical_resistance = if mean_conductance > 0.0 {
            1.0 / mean_conductance
        } else {
            0.0
        };
        let settle = self.settle_time(typical_resistance);

        let decoder = log2_ceil(self.rows) as f64 * tech.cell(LogicCell::Nand2).delay;
        let wordline = tech.wire_delay(self.wordline_length(), self.unit_wire_resistance);
        let mux = tech.cell(LogicCell::Mux2).delay;
        let adc = 2.0 * adc_bits as f64 * fo4;
        let shift_add = self.shift_add_bits(adc_bits) * tech.cell(LogicCell::FullAdder).delay;

        let latency_other = decoder + wordline + reads * (mux + settle);
        let latency_adc = reads * adc;
        let latency_accumulation = reads * shift_add;

        // Array energy: every column conducts once per row read.
        let array_energy: f64 = match self.readout {
            CellReadout::Resistive {
                read_voltage,
                read_pulse_width,
            } => finite
                .iter()
                .map(|r| read_voltage * read_voltage / r * read_pulse_width)
                .sum::<f64>(),
            CellReadout::Sram { min_sense_voltage } => {
                column_resistance.len() as f64 * self.bitline_cap() * tech.vdd * min_sense_voltage
            }
        } * row_reads;
        let wordline_energy = activated_rows * tech.wire_energy(self.wordline_length());
        let decoder_energy = activated_rows.max(1.0)
            * log2_ceil(self.rows) as f64
            * tech.cell(LogicCell::Nand2).energy;
        let mux_energy = self.cols as f64 * row_reads * tech.cell(LogicCell::Mux2).energy;

        let conversions = self.cols as f64 * row_reads;
        let energy_adc = conversions * adc_bits as f64 * 4.0 * tech.gate_energy(3.0);
        let energy_accumulation = conversions
            * self.shift_add_bits(adc_bits)
            * (tech.cell(LogicCell::FullAdder).energy + tech.cell(LogicCell::Dff).energy);

        SubArrayCost {
            latency_adc,
            latency_accumulation,
            latency_other,
            energy_adc,
            energy_accumulation,
            energy_other: array_energy + wordline_energy + decoder_energy + mux_energy,
        }
    }

    fn area(&self) -> AreaBreakdown {
        let tech = &self.tech;
        let f2 = tech.feature_size * tech.feature_size;
        let adc_bits = log2_ceil(self.level_output.max(2)) as f64;
        let num_adc = self.num_adc() as f64;

        let array_height = self.rows as f64 * self.cell_height;
        let array_width = self.cols as f64 * self.cell_width;
        let array = array_height * array_width;

        let adc = num_adc * adc_bits * ADC_AREA_PER_BIT_F2 * f2;
        let accumulation = num_adc
            * self.shift_add_bits(adc_bits as u32)
            * (tech.cell(LogicCell::FullAdder).area + tech.cell(LogicCell::Dff).area);
        let decoder = self.rows as f64
            * (tech.cell(LogicCell::Nand2).area + 2.0 * tech.cell(LogicCell::Inverter).area);
        let mux = self.cols as f64 * tech.cell(LogicCell::Mux2).area;
        let other = array + decoder + mux;

        let area = adc + accumulation + other;
        // Periphery stacks below the array; the outline keeps the array width.
        let width = array_width.max(f64::MIN_POSITIVE);
        AreaBreakdown {
            height: area / width,
            width,
            area,
            ic: 0.0,
            adc,
            accumulation,
            other,
        }
    }

    fn leakage(&self) -> f64 {
        let tech = &self.tech;
        let adc_bits = log2_ceil(self.level_output.max(2)) as f64;
        let num_adc = self.num_adc() as f64;
        let adc = num_adc * adc_bits * 4.0 * tech.leakage_power(3.0);
        let accumulation = num_adc
            * self.shift_add_bits(adc_bits as u32)
            * (tech.cell(LogicCell::FullAdder).leakage + tech.cell(LogicCell::Dff).leakage);
        let decoder = self.rows as f64 * tech.cell(LogicCell::Nand2).leakage;
        adc + accumulation + decoder
    }
}
