//! Tile estimation: a square grid of PEs with an accumulation tree, an
//! optional activation stage, tile buffers and an H-tree.

use crate::floorplan::MappingKind;
use crate::pe::{partial_sum_bits, Duplication, PeEstimator};
use crate::perf::{Bucket, Performance};
use xbar_circuit::{
    ActivationUnit, AdderTree, AreaBreakdown, Buffer, HTree, ModuleCost, SubArrayModel, Technology,
};
use xbar_common::{ceil_div, ceil_sqrt, log2_ceil};
use xbar_config::{ActivationKind, Params};
use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use xbar_workload::{InputMatrix, WeightMatrix};

/// Buffer cost whose latency and energy follow different access counts.
///
/// Buffers are written once per completed input word but their energy
/// scales with every bit-serial vector.
pub(crate) fn buffer_access(
    buffer: &Buffer,
    bits: f64,
    latency_reads: f64,
    energy_reads: f64,
) -> ModuleCost {
    let latency = buffer.calculate(bits, latency_reads, bits, latency_reads).latency();
    let energy = buffer.calculate(bits, energy_reads, bits, energy_reads).energy();
    ModuleCost::new(latency, energy)
}

/// Estimates one tile.
#[derive(Debug)]
pub struct TileEstimator {
    pe: PeEstimator,
    pe_outline: AreaBreakdown,
    num_pe: usize,
    pe_grid: usize,
    pe_size: usize,
    input_bit: usize,
    num_col_muxed: usize,
    accumulation: AdderTree,
    activation: Option<ActivationUnit>,
    input_buffer: Buffer,
    output_buffer: Buffer,
    htree: HTree,
}

impl TileEstimator {
    /// Creates a tile of `num_pe` PEs, each holding `pe_size × pe_size` weights.
    pub fn new(
        params: &Params,
        subarray: Box<dyn SubArrayModel>,
        num_pe: usize,
        pe_size: usize,
    ) -> Self {
        let tech = Technology::from_params(params);
        let num_pe = num_pe.max(1);
        let pe_size = pe_size.max(1);
        let pe_grid = ceil_sqrt(num_pe);
        let rows = params.num_row_subarray;
        let cols = params.num_col_subarray;
        let mux = params.num_col_muxed.max(1);
        let input_bit = params.input_bit as usize;

        let subarray_grid = ceil_sqrt(ceil_div(pe_size, rows) * ceil_div(pe_size, cols));
        let pe = PeEstimator::new(params, subarray, subarray_grid, subarray_grid);
        let pe_outline = pe.area();

        let accumulation_bits =
            partial_sum_bits(params) + log2_ceil(ceil_div(pe_size, rows)) as usize;
        let accumulation =
            AdderTree::new(pe_grid, accumulation_bits, ceil_div(pe_grid * cols, mux), tech);

        let activation = if params.chip_activation {
            None
        } else {
            Some(match params.activation {
                ActivationKind::Relu => ActivationUnit::new(
                    ActivationKind::Relu,
                    ceil_div(pe_size * cols, mux),
                    accumulation_bits,
                    input_bit,
                    tech,
                ),
                ActivationKind::Sigmoid => ActivationUnit::new(
                    ActivationKind::Sigmoid,
                    ceil_div(pe_grid * cols, mux),
                    accumulation.output_bits(),
                    input_bit,
                    tech,
                ),
            })
        };

        let word_bits = if activation.is_some() { input_bit } else { accumulation_bits };
        let output_buffer = Buffer::new(
            word_bits * num_pe * cols / mux,
            word_bits * num_pe,
            params.buffer,
            params.clock,
            tech,
        );
        let input_buffer = Buffer::new(input_bit * rows, num_pe, params.buffer, params.clock, tech);
        let htree = HTree::new(
            pe_grid,
            pe_grid,
            params.local_bus_delay_tolerance,
            num_pe * rows,
            params.wire.unit_length,
            tech,
        );

        Self {
            pe,
            pe_outline,
            num_pe,
            pe_grid,
            pe_size,
            input_bit,
            num_col_muxed: mux,
            accumulation,
            activation,
            input_buffer,
            output_buffer,
            htree,
        }
    }

    /// PEs in the tile.
    pub fn num_pe(&self) -> usize {
        self.num_pe
    }

    /// Weights per PE side.
    pub fn pe_size(&self) -> usize {
        self.pe_size
    }

    /// The PE every slot of the tile is built from.
    pub fn pe(&self) -> &PeEstimator {
        &self.pe
    }

    /// The tile accumulation tree.
    pub fn accumulation(&self) -> &AdderTree {
        &self.accumulation
    }

    /// The activation stage, absent when activation runs at chip level.
    pub fn activation(&self) -> Option<&ActivationUnit> {
        self.activation.as_ref()
    }

    fn words(&self, vectors: usize) -> f64 {
        vectors as f64 / self.input_bit.max(1) as f64
    }

    /// Row slices share their buffer and H-tree traffic along a PE row.
    fn traffic_divisor(&self, mapping: MappingKind) -> f64 {
        match mapping {
            MappingKind::Conventional => 1.0,
            MappingKind::Novel => self.pe_grid as f64,
        }
    }

    /// Reads charged to the accumulation tree and the activation stage.
    ///
    /// Both see one pass per multiplexed column group, independent of how
    /// many input vectors the layer streams.
    pub fn stage_reads(&self) -> f64 {
        self.num_col_muxed as f64
    }

    fn accumulate(&self, perf: &mut Performance, num_unit_add: usize) {
        let tree = self.accumulation.calculate(self.stage_reads(), num_unit_add);
        perf.add_module(tree, Bucket::Accumulation);
    }

    /// Activation and output-buffer cost for `cols` output columns.
    ///
    /// This is the only part of the tile that depends on where activation
    /// is computed.
    pub fn output_stage(&self, cols: usize, vectors: usize, mapping: MappingKind) -> Performance {
        let divisor = self.traffic_divisor(mapping);
        let words = self.words(vectors);
        let mut perf = Performance::default();
        let out_bits = match &self.activation {
            Some(unit) => {
                perf.add_module(unit.calculate(self.stage_reads()), Bucket::Other);
                unit.output_bits()
            }
            None => self.accumulation.num_adder_bit(),
        };
        let reads = words / divisor;
        perf.add_buffer(buffer_access(
            &self.output_buffer,
            (cols * (1 + out_bits)) as f64,
            reads,
            reads,
        ));
        perf
    }

    /// Estimates the tile for its share of a layer.
    ///
    /// `speed_up` is the layer's total duplication from the floor plan.
    pub fn estimate(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        mapping: MappingKind,
        speed_up: Duplication,
        sink: &DiagnosticSink,
    ) -> Performance {
        let mut perf = match mapping {
            MappingKind::Conventional => self.conventional(weights, inputs, speed_up, sink),
            MappingKind::Novel => self.novel(weights, inputs, speed_up, sink),
        };
        let rows = weights.rows();
        let cols = weights.cols();
        let vectors = inputs.vectors();
        let divisor = self.traffic_divisor(mapping);

        perf.merge_sequential(&self.output_stage(cols, vectors, mapping));
        perf.add_buffer(buffer_access(
            &self.input_buffer,
            rows as f64,
            self.words(vectors) / divisor,
            vectors as f64 / divisor,
        ));

        let transfers =
            (rows + cols) as f64 * self.words(vectors) / self.htree.bus_width() as f64 / divisor;
        let (h, w) = (self.pe_outline.height, self.pe_outline.width);
        perf.add_interconnect(match mapping {
            MappingKind::Conventional => self.htree.calculate(h, w, transfers),
            MappingKind::Novel => self.htree.calculate_neighbor(h, w, transfers),
        });

        perf.leakage = self.leakage();
        perf
    }

    fn conventional(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        speed_up: Duplication,
        sink: &DiagnosticSink,
    ) -> Performance {
        let rows = weights.rows();
        let cols = weights.cols();
        let size = self.pe_size;
        let grid = self.pe_grid;
        let row_blocks = ceil_div(rows, size);
        let col_blocks = ceil_div(cols, size);
        let mut perf = Performance::default();

        if speed_up.product() > 1 {
            let pe_dup =
                Duplication::new(ceil_div(speed_up.row, grid), ceil_div(speed_up.col, grid));
            if speed_up.row >= grid && speed_up.col >= grid {
                // every PE holds the whole matrix
                perf = self.pe.estimate(weights, inputs, pe_dup, sink);
                perf.divide_latency(self.num_pe as f64);
            } else {
                for i in 0..row_blocks {
                    for j in 0..col_blocks {
                        let block = weights.block(i * size, j * size, size, size);
                        let slice = inputs.slice_rows(i * size, size);
                        perf.merge_parallel(&self.pe.estimate(&block, &slice, pe_dup, sink));
                    }
                }
                let factor = speed_up.product() as f64 / self.num_pe as f64;
                if factor < 1.0 {
                    sink.emit(
                        Diagnostic::note(
                            DiagnosticCode::new(Category::Performance, 2),
                            "PE duplication is smaller than the tile",
                        )
                        .with_context(format!(
                            "{}x{} copies over {} PEs",
                            speed_up.row, speed_up.col, self.num_pe
                        ))
                        .with_note("no further speed-up is applied at tile level"),
                    );
                }
                perf.divide_latency(factor);
                if row_blocks > 1 {
                    self.accumulate(&mut perf, row_blocks);
                }
            }
        } else {
            if row_blocks > grid || col_blocks > grid {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::new(Category::Performance, 4),
                        "weight block exceeds the tile PE grid",
                    )
                    .with_context(format!("{rows}x{cols} weights"))
                    .with_note(format!("only {grid}x{grid} PEs of {size} rows are mapped")),
                );
            }
            for i in 0..grid.min(row_blocks) {
                for j in 0..grid.min(col_blocks) {
                    let block = weights.block(i * size, j * size, size, size);
                    let slice = inputs.slice_rows(i * size, size);
                    perf.merge_parallel(&self.pe.estimate(&block, &slice, Duplication::NONE, sink));
                }
            }
            self.accumulate(&mut perf, grid);
        }
        perf
    }

    fn novel(
        &self,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        speed_up: Duplication,
        sink: &DiagnosticSink,
    ) -> Performance {
        let rows = weights.rows();
        let slice_rows = ceil_div(rows, self.num_pe);
        let mut perf = Performance::default();
        for i in 0..self.num_pe {
            let start = i * slice_rows;
            if start >= rows {
                break;
            }
            let block = weights.block(start, 0, slice_rows, weights.cols());
            let slice = inputs.slice_rows(start, slice_rows);
            perf.merge_parallel(&self.pe.estimate(&block, &slice, Duplication::NONE, sink));
        }
        perf.divide_latency(speed_up.product() as f64);
        self.accumulate(&mut perf, self.pe_grid);
        perf
    }

    /// Leakage power of the tile (W).
    pub fn leakage(&self) -> f64 {
        self.pe.leakage() * self.num_pe as f64
            + self.accumulation.leakage()
            + self.input_buffer.leakage()
            + self.output_buffer.leakage()
            + self.activation.as_ref().map_or(0.0, ActivationUnit::leakage)
            + self.htree.leakage()
    }

    /// Area of the tile with its breakdown.
    pub fn area(&self) -> AreaBreakdown {
        let count = self.num_pe as f64;
        let pe = self.pe_outline;
        let htree = self.htree.area(pe.height, pe.width);
        let buffers = self.input_buffer.area() + self.output_buffer.area();
        let activation = self.activation.as_ref().map_or(0.0, ActivationUnit::area);
        let accumulation = self.accumulation.area();
        AreaBreakdown {
            area: pe.area * count + accumulation + activation + buffers + htree,
            ic: htree,
            adc: pe.adc * count,
            accumulation: pe.accumulation * count + accumulation,
            other: pe.other * count + activation + buffers + htree,
            ..Default::default()
        }
        .with_square_outline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{default_params, CountingSubArray};
    use std::cell::Cell;
    use std::rc::Rc;
    use xbar_circuit::build_subarray;

    fn ones(rows: usize, vectors: usize) -> InputMatrix {
        InputMatrix::filled(rows, vectors, true)
    }

    fn counting_tile(
        params: &Params,
        num_pe: usize,
        pe_size: usize,
    ) -> (TileEstimator, Rc<Cell<usize>>) {
        let (mock, calls) = CountingSubArray::new(params.num_row_subarray, params.num_col_subarray);
        (TileEstimator::new(params, Box::new(mock), num_pe, pe_size), calls)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn pe_grid_follows_pe_size() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 4, 256);
        assert_eq!(tile.pe().grid(), (2, 2));
        assert_eq!(tile.num_pe(), 4);
        assert_eq!(tile.pe_size(), 256);
    }

    #[test]
    fn no_duplication_spreads_over_every_pe() {
        let params = default_params();
        let (tile, calls) = counting_tile(&params, 4, 256);
        let sink = DiagnosticSink::new();

        let perf = tile.estimate(
            &WeightMatrix::filled(512, 512, 1e-6),
            &ones(512, 1),
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );

        // 2x2 PEs of 2x2 subarrays
        assert_eq!(calls.get(), 16);
        assert!(perf.energy.accumulation > 16.0 * CountingSubArray::COST.energy_accumulation);
        assert!(perf.leakage > 0.0);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn full_duplication_beats_spreading() {
        let params = default_params();
        let (tile, calls) = counting_tile(&params, 4, 256);
        let sink = DiagnosticSink::new();
        let weights = WeightMatrix::filled(256, 256, 1e-6);
        let inputs = ones(256, 8);

        let duplicated = tile.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::new(2, 2),
            &sink,
        );
        assert_eq!(calls.get(), 4 * 8);
        let spread = tile.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );

        assert!(duplicated.read_latency < spread.read_latency);
        assert!(duplicated.compute_latency() < spread.compute_latency());
    }

    #[test]
    fn small_partial_duplication_is_noted() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 4, 256);
        let sink = DiagnosticSink::new();

        tile.estimate(
            &WeightMatrix::filled(512, 256, 1e-6),
            &ones(512, 1),
            MappingKind::Conventional,
            Duplication::new(2, 1),
            &sink,
        );

        let codes: Vec<String> = sink.diagnostics().iter().map(|d| d.code.to_string()).collect();
        assert_eq!(codes, vec!["P002".to_string()]);
    }

    #[test]
    fn oversized_matrix_is_reported() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 4, 256);
        let sink = DiagnosticSink::new();
        tile.estimate(
            &WeightMatrix::filled(768, 256, 1e-6),
            &ones(768, 1),
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );
        assert!(sink.has_code("P004"));
    }

    #[test]
    fn novel_mapping_slices_rows_over_pes() {
        let params = default_params();
        let (tile, calls) = counting_tile(&params, 9, 128);
        let sink = DiagnosticSink::new();

        let perf = tile.estimate(
            &WeightMatrix::filled(9 * 128, 128, 1e-6),
            &ones(9 * 128, 1),
            MappingKind::Novel,
            Duplication::NONE,
            &sink,
        );

        assert_eq!(calls.get(), 9);
        assert!(perf.latency.accumulation > CountingSubArray::COST.latency_accumulation);
        assert!(perf.ic_latency > 0.0);
    }

    #[test]
    fn single_row_block_skips_the_accumulation_tree() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 4, 256);
        let sink = DiagnosticSink::new();
        let weights = WeightMatrix::filled(256, 256, 1e-6);
        let inputs = ones(256, 2);

        let perf = tile.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::new(1, 4),
            &sink,
        );
        let pe = tile.pe().estimate(&weights, &inputs, Duplication::new(1, 2), &sink);

        // buffers and H-tree only charge Other
        assert_eq!(perf.latency.accumulation, pe.latency.accumulation);
        assert_eq!(perf.energy.accumulation, pe.energy.accumulation);
        assert!(sink.diagnostics().is_empty());

        let taller = WeightMatrix::filled(512, 256, 1e-6);
        let perf = tile.estimate(
            &taller,
            &ones(512, 2),
            MappingKind::Conventional,
            Duplication::new(1, 4),
            &sink,
        );
        let tree = tile.accumulation().calculate(tile.stage_reads(), 2);
        assert!(close(perf.latency.accumulation, pe.latency.accumulation + tree.latency));
    }

    #[test]
    fn accumulation_reads_do_not_follow_the_vector_count() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 4, 256);
        let sink = DiagnosticSink::new();
        let weights = WeightMatrix::filled(512, 512, 1e-6);
        let block = weights.block(0, 0, 256, 256);
        let tree = tile.accumulation().calculate(params.num_col_muxed as f64, 2);
        assert_eq!(tile.stage_reads(), params.num_col_muxed as f64);

        for vectors in [8, 64] {
            let perf = tile.estimate(
                &weights,
                &ones(512, vectors),
                MappingKind::Conventional,
                Duplication::NONE,
                &sink,
            );
            let pe = tile.pe().estimate(&block, &ones(256, vectors), Duplication::NONE, &sink);
            assert!(close(perf.latency.accumulation - pe.latency.accumulation, tree.latency));
            let spread = perf.energy.accumulation - 4.0 * pe.energy.accumulation;
            assert!(close(spread, tree.dynamic_energy));
        }
    }

    #[test]
    fn novel_mapping_divides_latency_by_the_speed_up() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 9, 128);
        let sink = DiagnosticSink::new();
        let weights = WeightMatrix::filled(9 * 128, 128, 1e-6);
        let inputs = ones(9 * 128, 2);

        let single = tile.estimate(&weights, &inputs, MappingKind::Novel, Duplication::NONE, &sink);
        let copied = tile.estimate(
            &weights,
            &inputs,
            MappingKind::Novel,
            Duplication::new(2, 3),
            &sink,
        );

        assert!(close(copied.latency.adc, single.latency.adc / 6.0));
        let tree = tile.accumulation().calculate(tile.stage_reads(), 3).latency;
        assert!(close(
            copied.latency.accumulation - tree,
            (single.latency.accumulation - tree) / 6.0,
        ));
        // copies share the time, not the work
        assert_eq!(copied.energy.adc, single.energy.adc);
        assert!(copied.read_latency < single.read_latency);
    }

    #[test]
    fn chip_activation_only_changes_the_output_stage() {
        let with_chip = default_params();
        let mut in_tile = default_params();
        in_tile.chip_activation = false;
        let (a, _) = counting_tile(&with_chip, 4, 256);
        let (b, _) = counting_tile(&in_tile, 4, 256);
        assert!(a.activation().is_none());
        let sink = DiagnosticSink::new();
        let weights = WeightMatrix::filled(512, 512, 1e-6);
        let inputs = ones(512, 16);

        let perf_a = a.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );
        let perf_b = b.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );
        let stage_a = a.output_stage(512, 16, MappingKind::Conventional);
        let stage_b = b.output_stage(512, 16, MappingKind::Conventional);

        assert!(close(
            perf_b.read_dynamic_energy - perf_a.read_dynamic_energy,
            stage_b.read_dynamic_energy - stage_a.read_dynamic_energy,
        ));
        let unit = b.activation().unwrap().calculate(b.stage_reads());
        assert!(unit.dynamic_energy > 0.0);
        assert!(close(stage_b.energy.other - stage_b.buffer_dynamic_energy, unit.dynamic_energy));
    }

    #[test]
    fn estimates_are_repeatable() {
        let params = default_params();
        let tile = TileEstimator::new(&params, build_subarray(&params), 4, 256);
        let sink = DiagnosticSink::new();
        let weights = WeightMatrix::filled(300, 280, params.max_conductance);
        let inputs = ones(300, 4);
        let first = tile.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );
        let second = tile.estimate(
            &weights,
            &inputs,
            MappingKind::Conventional,
            Duplication::NONE,
            &sink,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn area_includes_every_pe() {
        let params = default_params();
        let (tile, _) = counting_tile(&params, 4, 256);
        let area = tile.area();
        assert!(area.area > 4.0 * tile.pe().area().area);
        assert!((area.adc + area.accumulation + area.other - area.area).abs() < 1e-15);
        assert!(area.ic > 0.0);
    }
}
