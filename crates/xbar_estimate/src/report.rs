//! Per-layer and whole-chip results.

use crate::floorplan::MappingKind;
use crate::perf::Performance;
use serde::Serialize;
use xbar_circuit::AreaBreakdown;

/// The estimate for one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerReport {
    /// Zero-based layer index.
    pub index: usize,
    /// Mapping the layer was placed with.
    pub mapping: MappingKind,
    /// Tiles holding the layer.
    pub num_tiles: usize,
    /// Latency, energy and breakdowns of the layer. `leakage` is the power
    /// of the layer's tiles.
    pub performance: Performance,
    /// Leakage power of one of the layer's tiles (W).
    pub tile_leakage: f64,
    /// Energy leaked by every other layer's tiles while this layer runs (J).
    pub leakage_energy: f64,
    /// Multiply-accumulate operations of the layer.
    pub num_computation: f64,
}

/// The estimate for a whole network, run layer by layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipReport {
    /// Per-layer results in network order.
    pub layers: Vec<LayerReport>,
    /// Chip area.
    pub area: AreaBreakdown,
    /// Layer results added in sequence; `leakage` is the chip leakage power.
    pub totals: Performance,
    /// Total leakage energy (J).
    pub leakage_energy: f64,
    /// Total operations.
    pub num_computation: f64,
    /// Operations per joule of dynamic plus leakage energy.
    pub energy_efficiency: f64,
    /// Energy efficiency in TOPS/W.
    pub tops_per_watt: f64,
    /// Inferences per second.
    pub throughput: f64,
}

impl ChipReport {
    /// Totals a set of layer reports.
    pub fn new(layers: Vec<LayerReport>, area: AreaBreakdown) -> Self {
        let mut totals = Performance::default();
        let mut leakage_energy = 0.0;
        let mut num_computation = 0.0;
        for layer in &layers {
            totals.merge_sequential(&layer.performance);
            totals.leakage += layer.performance.leakage;
            leakage_energy += layer.leakage_energy;
            num_computation += layer.num_computation;
        }

        let energy = totals.read_dynamic_energy + leakage_energy;
        let energy_efficiency = if energy > 0.0 { num_computation / energy } else { 0.0 };
        let throughput = if totals.read_latency > 0.0 { 1.0 / totals.read_latency } else { 0.0 };

        Self {
            layers,
            area,
            totals,
            leakage_energy,
            num_computation,
            energy_efficiency,
            tops_per_watt: energy_efficiency / 1e12,
            throughput,
        }
    }

    /// Dynamic plus leakage energy (J).
    pub fn total_energy(&self) -> f64 {
        self.totals.read_dynamic_energy + self.leakage_energy
    }
}
