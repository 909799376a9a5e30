//! Chip aggregation: tiles, global buffer, global H-tree, chip-level
//! accumulation, activation and pooling, combined layer by layer.

use crate::floorplan::{FloorPlan, MappingKind, TilingPlan};
use crate::pe::accumulation_reads;
use crate::perf::{Bucket, Performance};
use crate::report::{ChipReport, LayerReport};
use crate::tile::{buffer_access, TileEstimator};
use xbar_circuit::{
    build_subarray, ActivationUnit, AdderTree, AreaBreakdown, Buffer, HTree, MaxPool, SubArrayModel,
    Technology,
};
use xbar_common::{ceil_div, InternalError, XbarResult};
use xbar_config::Params;
use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use xbar_workload::{InputMatrix, LayerDescriptor, LayerTrace, Network, WeightMatrix};

/// Pooling window of the max-pool unit.
const POOL_WINDOW: usize = 4;

/// Estimates a whole chip for a floor plan.
#[derive(Debug)]
pub struct ChipEstimator {
    params: Params,
    plan: FloorPlan,
    conventional: TileEstimator,
    novel: Option<TileEstimator>,
    global_buffer: Buffer,
    global_htree: HTree,
    global_accumulation: AdderTree,
    activation: Option<ActivationUnit>,
    activation_units: usize,
    max_pool: MaxPool,
    pool_units: usize,
}

/// Width of the global bus: all tile ports folded by the tree ratio, bounded
/// by the configured maximum.
fn global_bus_width(params: &Params, plan: &FloorPlan) -> usize {
    let ports: usize = plan.layers.iter().map(|l| l.tile_rows + l.tile_cols).sum();
    (ports / params.tree_folded_ratio.max(1))
        .min(params.max_global_bus_width)
        .max(1)
}

impl ChipEstimator {
    /// Creates an estimator using the analytic subarray model.
    pub fn new(params: &Params, plan: FloorPlan) -> Self {
        Self::with_subarray_builder(params, plan, build_subarray)
    }

    /// Creates an estimator with a custom subarray model for every tile.
    pub fn with_subarray_builder(
        params: &Params,
        plan: FloorPlan,
        builder: impl Fn(&Params) -> Box<dyn SubArrayModel>,
    ) -> Self {
        let tech = Technology::from_params(params);
        let input_bit = params.input_bit as usize;
        let mux = params.num_col_muxed.max(1);

        let conventional =
            TileEstimator::new(params, builder(params), plan.num_pe_cm(), plan.pe_size_cm);
        let novel = plan
            .has_novel()
            .then(|| TileEstimator::new(params, builder(params), plan.num_pe_nm, plan.pe_size_nm));

        let bus_width = global_bus_width(params, &plan);
        let global_buffer = Buffer::new(
            input_bit * plan.max_layer_inputs,
            bus_width,
            params.buffer,
            params.clock,
            tech,
        );
        let global_htree = HTree::new(
            plan.chip_tile_rows,
            plan.chip_tile_cols,
            params.global_bus_delay_tolerance,
            bus_width,
            params.wire.unit_length,
            tech,
        );

        let tile_bits = conventional.accumulation().output_bits();
        let global_accumulation = AdderTree::new(
            plan.chip_tile_rows,
            tile_bits,
            ceil_div(plan.tile_size_cm, mux),
            tech,
        );
        let activation_units = ceil_div(plan.tile_size_cm, mux).max(1);
        let activation = params.chip_activation.then(|| {
            ActivationUnit::new(
                params.activation,
                activation_units,
                global_accumulation.output_bits(),
                input_bit,
                tech,
            )
        });
        let pool_units = plan.tile_size_cm.max(1);
        let max_pool = MaxPool::new(input_bit, POOL_WINDOW, pool_units, tech);

        Self {
            params: params.clone(),
            plan,
            conventional,
            novel,
            global_buffer,
            global_htree,
            global_accumulation,
            activation,
            activation_units,
            max_pool,
            pool_units,
        }
    }

    /// The floor plan being estimated.
    pub fn plan(&self) -> &FloorPlan {
        &self.plan
    }

    fn tile_for(&self, tiling: &TilingPlan) -> XbarResult<&TileEstimator> {
        match tiling.mapping {
            MappingKind::Conventional => Ok(&self.conventional),
            MappingKind::Novel => self
                .novel
                .as_ref()
                .ok_or_else(|| InternalError::new("novel layer planned without novel tiles")),
        }
    }

    /// Estimates one layer of the network the plan was built for.
    pub fn estimate_layer(
        &self,
        index: usize,
        layer: &LayerDescriptor,
        weights: &WeightMatrix,
        inputs: &InputMatrix,
        sink: &DiagnosticSink,
    ) -> XbarResult<LayerReport> {
        let tiling = self
            .plan
            .layers
            .get(index)
            .ok_or_else(|| InternalError::new(format!("no tiling for layer {}", index + 1)))?;
        let rows = layer.weight_rows(self.params.num_row_per_synapse);
        let cols = layer.weight_cols(self.params.num_col_per_synapse);
        if weights.rows() != rows || weights.cols() != cols {
            return Err(InternalError::new(format!(
                "layer {} weights are {}x{}, expected {rows}x{cols}",
                index + 1,
                weights.rows(),
                weights.cols()
            )));
        }
        if inputs.rows() != rows {
            return Err(InternalError::new(format!(
                "layer {} inputs have {} rows, expected {rows}",
                index + 1,
                inputs.rows()
            )));
        }
        let vectors = inputs.vectors();
        if vectors == 0 {
            sink.emit(
                Diagnostic::note(
                    DiagnosticCode::new(Category::Performance, 3),
                    "layer has no input vectors",
                )
                .with_context(format!("layer {}", index + 1))
                .with_note("only leakage is reported"),
            );
        }

        let tile = self.tile_for(tiling)?;
        let mut perf = Performance::default();
        for i in 0..tiling.num_tile_row {
            for j in 0..tiling.num_tile_col {
                let block = weights.block(
                    i * tiling.tile_rows,
                    j * tiling.tile_cols,
                    tiling.tile_rows,
                    tiling.tile_cols,
                );
                let slice = inputs.slice_rows(i * tiling.tile_rows, tiling.tile_rows);
                let speed_up = tiling.speed_up();
                perf.merge_parallel(&tile.estimate(&block, &slice, tiling.mapping, speed_up, sink));
            }
        }

        let input_bit = self.params.input_bit as usize;
        let mux = self.params.num_col_muxed.max(1);
        let words = vectors as f64 / input_bit.max(1) as f64;
        if tiling.num_tile_row > 1 {
            let reads = accumulation_reads(vectors, input_bit, mux);
            perf.add_module(
                self.global_accumulation.calculate(reads, tiling.num_tile_row),
                Bucket::Accumulation,
            );
        }
        if let Some(unit) = &self.activation {
            let passes = words * ceil_div(cols, self.activation_units) as f64;
            perf.add_module(unit.calculate(passes), Bucket::Other);
        }
        if layer.pooling {
            let outputs = (layer.output_positions() * layer.output_channels) as f64;
            let reads = (outputs / POOL_WINDOW as f64 / self.pool_units as f64).ceil();
            perf.add_module(self.max_pool.calculate(reads), Bucket::Other);
        }

        perf.add_buffer(buffer_access(&self.global_buffer, rows as f64, words, vectors as f64));
        let output_bits = (cols * input_bit) as f64;
        perf.add_buffer(buffer_access(&self.global_buffer, output_bits, words, words));
        let tile_area = tile.area();
        let transfers = (rows + cols) as f64 * words / self.global_htree.bus_width() as f64;
        let htree = self.global_htree.calculate(tile_area.height, tile_area.width, transfers);
        perf.add_interconnect(htree);

        let tile_leakage = tile.leakage();
        perf.leakage = tile_leakage * tiling.num_tiles() as f64;
        let idle_tiles = self.plan.total_tiles().saturating_sub(tiling.num_tiles());

        Ok(LayerReport {
            index,
            mapping: tiling.mapping,
            num_tiles: tiling.num_tiles(),
            performance: perf,
            tile_leakage,
            leakage_energy: idle_tiles as f64 * perf.read_latency * tile_leakage,
            num_computation: layer.num_computation(),
        })
    }

    /// Totals per-layer results into a chip report.
    pub fn summarize(&self, layers: Vec<LayerReport>) -> ChipReport {
        ChipReport::new(layers, self.area())
    }

    /// Estimates every layer of a network with one trace per layer.
    pub fn estimate_network(
        &self,
        network: &Network,
        traces: &[LayerTrace],
        sink: &DiagnosticSink,
    ) -> XbarResult<ChipReport> {
        if traces.len() != network.len() {
            return Err(InternalError::new(format!(
                "{} traces for {} layers",
                traces.len(),
                network.len()
            )));
        }
        let layers = network
            .layers()
            .iter()
            .zip(traces)
            .enumerate()
            .map(|(index, (layer, trace))| {
                self.estimate_layer(index, layer, &trace.weights, &trace.inputs, sink)
            })
            .collect::<XbarResult<Vec<_>>>()?;
        Ok(self.summarize(layers))
    }

    /// Area of the chip with its breakdown.
    pub fn area(&self) -> AreaBreakdown {
        let cm = self.conventional.area();
        let count_cm = self.plan.num_tile_cm as f64;
        let (nm, count_nm) = match &self.novel {
            Some(tile) => (tile.area(), self.plan.num_tile_nm as f64),
            None => (AreaBreakdown::default(), 0.0),
        };
        let htree = self.global_htree.area(cm.height, cm.width);
        let buffer = self.global_buffer.area();
        let accumulation = self.global_accumulation.area();
        let activation = self.activation.as_ref().map_or(0.0, ActivationUnit::area);
        let pool = self.max_pool.area();

        AreaBreakdown {
            area: cm.area * count_cm
                + nm.area * count_nm
                + htree
                + buffer
                + accumulation
                + activation
                + pool,
            ic: cm.ic * count_cm + nm.ic * count_nm + htree,
            adc: cm.adc * count_cm + nm.adc * count_nm,
            accumulation: cm.accumulation * count_cm + nm.accumulation * count_nm + accumulation,
            other: cm.other * count_cm + nm.other * count_nm + htree + buffer + activation + pool,
            ..Default::default()
        }
        .with_square_outline()
    }

    /// Leakage power of all tiles and global circuits (W).
    pub fn leakage(&self) -> f64 {
        let novel = self.novel.as_ref().map_or(0.0, |t| t.leakage() * self.plan.num_tile_nm as f64);
        self.conventional.leakage() * self.plan.num_tile_cm as f64
            + novel
            + self.global_buffer.leakage()
            + self.global_htree.leakage()
            + self.global_accumulation.leakage()
            + self.activation.as_ref().map_or(0.0, ActivationUnit::leakage)
            + self.max_pool.leakage()
    }
}
