//! Processing-element estimation: a grid of subarrays with an adder tree,
//! register buffers and buses.

use crate::perf::{Bucket, Performance};
use crate::resistance::ColumnResistanceResolver;
use serde::Serialize;
use xbar_circuit::{
    AdderTree, AreaBreakdown, Bus, BusOrientation, ModuleCost, RegisterBuffer, SubArrayModel,
    Technology,
};
use xbar_common::{ceil_div, log2_ceil};
use xbar_config::Params;
use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use xbar_workload::{InputMatrix, WeightMatrix};

/// How many physical copies of a weight block exist along each dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duplication {
    /// Copies along the rows.
    pub row: usize,
    /// Copies along the columns.
    pub col: usize,
}

impl Duplication {
    /// A single copy.
    pub const NONE: Duplication = Duplication { row: 1, col: 1 };

    /// Creates a duplication factor; zero counts as one.
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row: row.max(1),
            col: col.max(1),
        }
    }

    /// Total number of copies.
    pub fn product(&self) -> usize {
        self.row * self.col
    }
}

/// Width of the partial sums leaving one subarray column.
pub(crate) fn partial_sum_bits(params: &Params) -> usize {
    let input = params.input_bit as usize;
    if params.parallel_read {
        log2_ceil(params.level_output) as usize + input + 1
    } else {
        (log2_ceil(params.num_row_subarray) + params.cell_bit - 1) as usize + input + 1
    }
}

/// Adder-tree passes for `vectors` input bit-vectors: one per column group
/// per completed input word.
pub(crate) fn accumulation_reads(vectors: usize, input_bit: usize, num_col_muxed: usize) -> f64 {
    vectors as f64 / input_bit.max(1) as f64 * num_col_muxed as f64
}

/// Estimates one processing element.
///
/// The estimator owns its subarray model and peripheral circuits; they are
/// sized once in [`PeEstimator::new`] and reused for every call.
#[derive(Debug)]
pub struct PeEstimator {
    subarray: Box<dyn SubArrayModel>,
    resolver: ColumnResistanceResolver,
    num_subarray_row: usize,
    num_subarray_col: usize,
    subarray_rows: usize,
    subarray_cols: usize,
    level_output: usize,
    input_bit: usize,
    num_col_muxed: usize,
    adder_tree: AdderTree,
    input_buffer: RegisterBuffer,
    output_buffer: RegisterBuffer,
    input_bus: Bus,
    output_bus: Bus,
}

impl PeEstimator {
    /// Creates a PE of `num_subarray_row × num_subarray_col` subarrays.
    pub fn new(
        params: &Params,
        subarray: Box<dyn SubArrayModel>,
        num_subarray_row: usize,
        num_subarray_col: usize,
    ) -> Self {
        let tech = Technology::from_params(params);
        let num_subarray_row = num_subarray_row.max(1);
        let num_subarray_col = num_subarray_col.max(1);
        let rows = params.num_row_subarray;
        let cols = params.num_col_subarray;
        let input_bit = params.input_bit as usize;

        let adder_tree = AdderTree::new(
            num_subarray_row,
            partial_sum_bits(params),
            ceil_div(num_subarray_col * cols, params.num_col_muxed),
            tech,
        );
        let input_buffer = RegisterBuffer::new(input_bit * rows, params.clock, tech);
        let output_buffer = RegisterBuffer::new(
            (cols / params.num_col_muxed.max(1)) * adder_tree.output_bits(),
            params.clock,
            tech,
        );
        let outline = subarray.area();
        let input_bus = Bus::new(
            BusOrientation::Horizontal,
            num_subarray_row,
            num_subarray_col,
            0.0,
            rows,
            outline.height,
            outline.width,
            params.wire.unit_length,
            tech,
        );
        let output_bus = Bus::new(
            BusOrientation::Vertical,
            num_subarray_row,
            num_subarray_col,
            0.0,
            cols,
            outline.height,
            outline.width,
            params.wire.unit_length,
            tech,
        );

        Self {
            subarray,
            resolver: ColumnResistanceResolver::new(params),
            num_subarray_row,
            num_subarray_col,
            subarray_rows: rows,
            subarray_cols: cols,
            level_output: params.effective_level_output(),
            input_bit,
            num_col_muxed: params.num_col_muxed,
            adder_tree,
            input_buffer,
            output_buffer,
            input_bus,
            output_bus,
        }
    }

    /// Subarrays per grid row and column.
    pub fn grid(&self) -> (usize, usize) {
        (self.num_subarray_row, self.num_subarray_col)
    }

    /// The PE's adder tree.
    pub fn adder_tree(&self) -> &AdderTree {
        &self.adder_tree
    }

    /// Runs every input vector of a block through one subarray.
    fn run_block(&self, weights: &WeightMatrix, inputs: &InputMatrix) -> Performance {
        let mut perf = Performance::default();
        for k in 0..inputs.vectors() {
            let input = inputs.vector(k);
            let resistance = self.resolver.resolve(&input, weights);
            let cost = self
                .subarray
                .calculate(&resistance, inputs.activity(k), self.level_output);
            perf.add_subarray_read(&cost);
        }
        perf
    }

    /// A block followed by the adder tree combining the row tiles.
    fn run_block_with_adder(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        row_tiles: usize,
    ) -> Performance {
        let mut perf = self.run_block(weights, inputs);
        let reads = accumulation_reads(inputs.vectors(), self.input_bit, self.num_col_muxed);
        perf.add_module(self.adder_tree.calculate(reads, row_tiles), Bucket::Accumulation);
        perf
    }

    fn block_at(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        i: usize,
        j: usize,
    ) -> (WeightMatrix, InputMatrix) {
        let (r, c) = (self.subarray_rows, self.subarray_cols);
        (
            weights.block(i * r, j * c, r, c),
            inputs.slice_rows(i * r, r),
        )
    }

    /// Spreads the matrix over the subarray grid, one block per subarray.
    ///
    /// Blocks beyond the grid are dropped and reported as `P001`.
    fn run_grid(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        sink: &DiagnosticSink,
    ) -> Performance {
        let (rows, cols) = (weights.rows(), weights.cols());
        let row_tiles = ceil_div(rows, self.subarray_rows);
        let col_tiles = ceil_div(cols, self.subarray_cols);
        if row_tiles > self.num_subarray_row || col_tiles > self.num_subarray_col {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::new(Category::Performance, 1),
                    "weight block exceeds the PE subarray grid",
                )
                .with_context(format!("{rows}x{cols} weights"))
                .with_note(format!(
                    "only {}x{} subarrays are mapped",
                    self.num_subarray_row, self.num_subarray_col
                )),
            );
        }
        let mut perf = Performance::default();
        for i in 0..self.num_subarray_row.min(row_tiles) {
            for j in 0..self.num_subarray_col.min(col_tiles) {
                let (block, slice) = self.block_at(weights, inputs, i, j);
                perf.merge_parallel(&self.run_block_with_adder(&block, &slice, row_tiles));
            }
        }
        perf
    }

    /// Estimates the PE for one weight block and its input vectors.
    ///
    /// `dup` is the number of subarray copies of the weights inside this PE.
    /// With copies the block latency is divided by the copy count; without,
    /// the matrix is spread over the subarray grid and the slowest subarray
    /// sets the latency.
    pub fn estimate(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        dup: Duplication,
        sink: &DiagnosticSink,
    ) -> Performance {
        let rows = weights.rows();
        let cols = weights.cols();

        let mut perf = if dup.product() > 1 {
            let mut perf = if dup.row < self.num_subarray_row || dup.col < self.num_subarray_col {
                self.run_grid(weights, inputs, sink)
            } else {
                // every copy holds the whole matrix: no partial sums to add
                self.run_block(weights, inputs)
            };
            perf.divide_latency(dup.product() as f64);
            perf
        } else {
            self.run_grid(weights, inputs, sink)
        };

        // buffer and bus traffic does not depend on the mapping
        let vectors = inputs.vectors() as f64;
        let words = vectors / self.input_bit.max(1) as f64;
        perf.add_buffer(self.input_buffer.calculate(rows as f64, vectors));
        perf.add_buffer(self.output_buffer.calculate(
            (cols * self.adder_tree.num_adder_bit()) as f64,
            words,
        ));
        perf.add_interconnect(self.bus_transfer(&self.input_bus, rows as f64 * vectors));
        perf.add_interconnect(self.bus_transfer(
            &self.output_bus,
            (cols * self.adder_tree.num_adder_bit()) as f64 * words,
        ));

        perf.leakage = self.leakage();
        perf
    }

    fn bus_transfer(&self, bus: &Bus, bits: f64) -> ModuleCost {
        let lane_bits = (bus.num_lanes() * bus.bus_width()) as f64;
        bus.calculate(bits / lane_bits)
    }

    /// Leakage power of the whole PE (W).
    pub fn leakage(&self) -> f64 {
        self.subarray.leakage() * (self.num_subarray_row * self.num_subarray_col) as f64
            + self.adder_tree.leakage()
            + self.input_buffer.leakage()
            + self.output_buffer.leakage()
    }

    /// Area of the PE with its breakdown.
    pub fn area(&self) -> AreaBreakdown {
        let count = (self.num_subarray_row * self.num_subarray_col) as f64;
        let sub = self.subarray.area();
        let buffers = self.input_buffer.area() + self.output_buffer.area();
        let buses = self.input_bus.area() + self.output_bus.area();
        let adder = self.adder_tree.area();
        AreaBreakdown {
            area: sub.area * count + adder + buffers + buses,
            ic: buses,
            adc: sub.adc * count,
            accumulation: sub.accumulation * count + adder,
            other: sub.other * count + buffers + buses,
            ..Default::default()
        }
        .with_square_outline()
    }
}
