//! Chip floor-planning: tile and PE sizing, mapping choice and duplication.
//!
//! One pass over the network decides everything the estimators need:
//!
//! 1. which layers use the novel (near-memory) mapping,
//! 2. the conventional tile size and the novel PE size that maximise
//!    utilisation,
//! 3. the conventional PE size inside the tile,
//! 4. PE and subarray duplication per layer, hence the speed-up,
//! 5. tile counts, utilisation and tile placement per layer.

use crate::pe::Duplication;
use serde::Serialize;
use std::collections::HashMap;
use xbar_common::{ceil_div, ceil_sqrt, floor_ratio_at_least_one};
use xbar_config::Params;
use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use xbar_workload::{LayerDescriptor, Network};

/// How a layer's weight matrix is laid out over PEs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    /// 2-D tiling over the PE grid.
    Conventional,
    /// Row slices, one kernel position per PE.
    Novel,
}

/// Where a layer's first tile sits on the chip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TileLocation {
    /// Row-major index of the first tile.
    pub index: usize,
    /// Tile row.
    pub row: usize,
    /// Tile column.
    pub col: usize,
}

/// The mapping decisions for one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilingPlan {
    /// Tiles along the weight rows.
    pub num_tile_row: usize,
    /// Tiles along the weight columns.
    pub num_tile_col: usize,
    /// PEs per tile.
    pub num_pe: usize,
    /// Rows (and columns) of weights per PE.
    pub pe_size: usize,
    /// Weight rows held by one tile.
    pub tile_rows: usize,
    /// Weight columns held by one tile.
    pub tile_cols: usize,
    /// Copies of the weights along the rows.
    pub speed_up_row: usize,
    /// Copies of the weights along the columns.
    pub speed_up_col: usize,
    /// Mapping kind.
    pub mapping: MappingKind,
    /// Fraction of the layer's cells that hold weights.
    pub utilization: f64,
    /// Placement of the first tile.
    pub tile_location: TileLocation,
}

impl TilingPlan {
    /// Tiles used by the layer.
    pub fn num_tiles(&self) -> usize {
        self.num_tile_row * self.num_tile_col
    }

    /// Whether the layer is computed near memory.
    pub fn near_memory(&self) -> bool {
        self.mapping == MappingKind::Novel
    }

    /// Speed-up as a duplication factor.
    pub fn speed_up(&self) -> Duplication {
        Duplication::new(self.speed_up_row, self.speed_up_col)
    }
}

/// The floor plan of a whole chip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorPlan {
    /// Per-layer decisions, in network order.
    pub layers: Vec<TilingPlan>,
    /// Conventional tile size (rows = columns).
    pub tile_size_cm: usize,
    /// Conventional PE size.
    pub pe_size_cm: usize,
    /// Conventional tiles on the chip.
    pub num_tile_cm: usize,
    /// Novel PE size; zero without novel layers.
    pub pe_size_nm: usize,
    /// PEs per novel tile; zero without novel layers.
    pub num_pe_nm: usize,
    /// Novel tiles on the chip.
    pub num_tile_nm: usize,
    /// Rows of the chip's tile grid.
    pub chip_tile_rows: usize,
    /// Columns of the chip's tile grid.
    pub chip_tile_cols: usize,
    /// Weighted utilisation over all tiles.
    pub chip_utilization: f64,
    /// Largest layer input feature map `H·W·C`, which sizes the global buffer.
    pub max_layer_inputs: usize,
}

impl FloorPlan {
    /// All tiles on the chip.
    pub fn total_tiles(&self) -> usize {
        self.num_tile_cm + self.num_tile_nm
    }

    /// PEs per conventional tile.
    pub fn num_pe_cm(&self) -> usize {
        let side = self.tile_size_cm / self.pe_size_cm.max(1);
        side * side
    }

    /// Whether any layer uses the novel mapping.
    pub fn has_novel(&self) -> bool {
        self.num_tile_nm > 0
    }
}

/// The weight-matrix dimensions of one layer.
#[derive(Debug, Clone, Copy)]
struct LayerShape {
    rows: usize,
    cols: usize,
    channel_rows: usize,
    kernel_area: usize,
    cells: f64,
}

impl LayerShape {
    fn new(layer: &LayerDescriptor, params: &Params) -> Self {
        let rows = layer.weight_rows(params.num_row_per_synapse);
        let cols = layer.weight_cols(params.num_col_per_synapse);
        Self {
            rows,
            cols,
            channel_rows: layer.input_channels * params.num_row_per_synapse,
            kernel_area: layer.kernel_area(),
            cells: rows as f64 * cols as f64,
        }
    }
}

/// Tries `start`, then halves while above `floor`, keeping the size with
/// the strictly highest utilisation.
fn halving_search(
    start: usize,
    floor: usize,
    mut utilization: impl FnMut(usize) -> f64,
) -> (usize, f64) {
    let mut best = (start, utilization(start));
    let mut size = start / 2;
    while size > floor {
        let u = utilization(size);
        if u > best.1 {
            best = (size, u);
        }
        size /= 2;
    }
    best
}

/// The most frequent kernel area above one; ties go to the earliest layer.
fn most_common_kernel(shapes: &[LayerShape]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for shape in shapes.iter().filter(|s| s.kernel_area > 1) {
        *counts.entry(shape.kernel_area).or_default() += 1;
    }
    let mut best: Option<(usize, usize)> = None;
    for shape in shapes.iter().filter(|s| s.kernel_area > 1) {
        let count = counts[&shape.kernel_area];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((shape.kernel_area, count));
        }
    }
    best.map(|(area, _)| area)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

struct Planner<'a> {
    params: &'a Params,
    shapes: Vec<LayerShape>,
    novel: Vec<bool>,
    num_pe_nm: usize,
}

impl Planner<'_> {
    fn conventional(&self) -> impl Iterator<Item = &LayerShape> {
        self.shapes.iter().zip(&self.novel).filter(|(_, &n)| !n).map(|(s, _)| s)
    }

    fn novel_layers(&self) -> impl Iterator<Item = &LayerShape> {
        self.shapes.iter().zip(&self.novel).filter(|(_, &n)| n).map(|(s, _)| s)
    }

    fn tiles_cm(&self, tile: usize) -> usize {
        self.conventional()
            .map(|s| ceil_div(s.rows, tile) * ceil_div(s.cols, tile))
            .sum()
    }

    fn tile_utilization_cm(&self, tile: usize) -> f64 {
        let cells: f64 = self.conventional().map(|s| s.cells).sum();
        ratio(cells, (self.tiles_cm(tile) * tile * tile) as f64)
    }

    fn tiles_nm(&self, pe: usize) -> usize {
        self.novel_layers()
            .map(|s| ceil_div(s.channel_rows, pe) * ceil_div(s.cols, pe))
            .sum()
    }

    fn tile_utilization_nm(&self, pe: usize) -> f64 {
        let cells: f64 = self.novel_layers().map(|s| s.cells).sum();
        ratio(cells, (self.tiles_nm(pe) * pe * pe * self.num_pe_nm) as f64)
    }

    /// PE copies of a conventional layer inside one tile.
    fn pe_dup(&self, shape: &LayerShape, pe: usize, tile: usize) -> Duplication {
        if shape.rows <= tile || shape.cols <= tile {
            let available = ceil_div(tile, pe);
            Duplication::new(
                floor_ratio_at_least_one(available, ceil_div(shape.rows, pe)),
                floor_ratio_at_least_one(available, ceil_div(shape.cols, pe)),
            )
        } else {
            Duplication::NONE
        }
    }

    fn pe_utilization_cm(&self, pe: usize, tile: usize) -> f64 {
        let cells: f64 = self
            .conventional()
            .map(|s| self.pe_dup(s, pe, tile).product() as f64 * s.cells)
            .sum();
        ratio(cells, (self.tiles_cm(tile) * tile * tile) as f64)
    }

    /// Subarray copies of a layer inside one PE of `pe` rows.
    fn subarray_dup(&self, rows: usize, cols: usize, pe: usize) -> Duplication {
        if rows <= pe || cols <= pe {
            let r = self.params.num_row_subarray;
            let c = self.params.num_col_subarray;
            Duplication::new(
                floor_ratio_at_least_one(ceil_div(pe, r), ceil_div(rows, r)),
                floor_ratio_at_least_one(ceil_div(pe, c), ceil_div(cols, c)),
            )
        } else {
            Duplication::NONE
        }
    }
}

/// Plans the chip for a network.
///
/// Sizes below the minimum the hierarchy allows (a tile of four subarray
/// heights, a PE of two) are clamped and reported as `F0xx` diagnostics.
pub fn plan_chip(network: &Network, params: &Params, sink: &DiagnosticSink) -> FloorPlan {
    let shapes: Vec<LayerShape> = network
        .layers()
        .iter()
        .map(|l| LayerShape::new(l, params))
        .collect();
    let r = params.num_row_subarray;

    let mut novel = vec![false; shapes.len()];
    let mut num_pe_nm = 0;
    if params.novel_mapping {
        if let Some(kernel) = most_common_kernel(&shapes) {
            for (mark, shape) in novel.iter_mut().zip(&shapes) {
                *mark = shape.kernel_area == kernel && shape.channel_rows >= r;
            }
        }
        if novel.iter().any(|&n| n) {
            num_pe_nm = most_common_kernel(&shapes).unwrap_or(0);
        } else {
            sink.emit(
                Diagnostic::note(
                    DiagnosticCode::new(Category::Floorplan, 3),
                    "no layer qualifies for novel mapping",
                )
                .with_help(
                    "novel mapping needs a kernel above 1x1 and a subarray of input channels",
                ),
            );
        }
    }
    let planner = Planner {
        params,
        shapes,
        novel,
        num_pe_nm,
    };

    // novel PE size
    let mut pe_size_nm = 0;
    if planner.num_pe_nm > 0 {
        let floor = 2 * r;
        let max_pe = planner
            .novel_layers()
            .map(|s| s.cols.next_power_of_two())
            .max()
            .unwrap_or(0);
        if max_pe < floor {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::new(Category::Floorplan, 2),
                    "novel-mapped layers are narrower than two subarrays",
                )
                .with_note(format!("PE size clamped from {max_pe} to {floor}")),
            );
        }
        let (best, _) =
            halving_search(max_pe.max(floor), floor, |pe| planner.tile_utilization_nm(pe));
        pe_size_nm = best;
    }

    // conventional tile size
    let floor = 4 * r;
    let max_tile = planner.conventional().map(|s| s.cols.next_power_of_two()).max();
    if let Some(max_tile) = max_tile {
        if max_tile < floor {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::new(Category::Floorplan, 1),
                    "layers are narrower than four subarrays",
                )
                .with_note(format!("tile size clamped from {max_tile} to {floor}")),
            );
        }
    }
    let (tile_size_cm, mut best) = halving_search(max_tile.unwrap_or(0).max(floor), floor, |tile| {
        planner.tile_utilization_cm(tile)
    });

    // conventional PE size: a smaller PE must pay for itself in duplication
    let mut pe_size_cm = tile_size_cm / 2;
    let mut size = tile_size_cm / 2;
    while size > 2 * r {
        let u = planner.pe_utilization_cm(size, tile_size_cm);
        if u > best {
            best = u;
            pe_size_cm = size;
        }
        size /= 2;
    }

    let mut layers = Vec::with_capacity(planner.shapes.len());
    for (shape, &is_novel) in planner.shapes.iter().zip(&planner.novel) {
        let plan = if is_novel {
            let sub = planner.subarray_dup(shape.channel_rows, shape.cols, pe_size_nm);
            let num_tile_row = ceil_div(shape.channel_rows, pe_size_nm);
            let num_tile_col = ceil_div(shape.cols, pe_size_nm);
            let pe_weights = pe_size_nm * pe_size_nm * planner.num_pe_nm;
            let capacity = (num_tile_row * num_tile_col * pe_weights) as f64;
            TilingPlan {
                num_tile_row,
                num_tile_col,
                num_pe: planner.num_pe_nm,
                pe_size: pe_size_nm,
                tile_rows: pe_size_nm * planner.num_pe_nm,
                tile_cols: pe_size_nm,
                speed_up_row: sub.row,
                speed_up_col: sub.col,
                mapping: MappingKind::Novel,
                utilization: ratio(sub.product() as f64 * shape.cells, capacity),
                tile_location: TileLocation::default(),
            }
        } else {
            let pe = planner.pe_dup(shape, pe_size_cm, tile_size_cm);
            let sub = planner.subarray_dup(shape.rows, shape.cols, pe_size_cm);
            let num_tile_row = ceil_div(shape.rows, tile_size_cm);
            let num_tile_col = ceil_div(shape.cols, tile_size_cm);
            let capacity = (num_tile_row * num_tile_col * tile_size_cm * tile_size_cm) as f64;
            let side = tile_size_cm / pe_size_cm;
            TilingPlan {
                num_tile_row,
                num_tile_col,
                num_pe: side * side,
                pe_size: pe_size_cm,
                tile_rows: side * pe_size_cm,
                tile_cols: side * pe_size_cm,
                speed_up_row: pe.row * sub.row,
                speed_up_col: pe.col * sub.col,
                mapping: MappingKind::Conventional,
                utilization: ratio((pe.product() * sub.product()) as f64 * shape.cells, capacity),
                tile_location: TileLocation::default(),
            }
        };
        layers.push(plan);
    }

    let tiles = |near: bool| -> usize {
        layers
            .iter()
            .filter(|l| l.near_memory() == near)
            .map(TilingPlan::num_tiles)
            .sum()
    };
    let num_tile_cm = tiles(false);
    let num_tile_nm = tiles(true);
    let total = num_tile_cm + num_tile_nm;
    let chip_tile_cols = ceil_sqrt(total).max(1);
    let chip_tile_rows = ceil_div(total, chip_tile_cols).max(1);

    let mut index = 0;
    let mut mapped = 0.0;
    for layer in &mut layers {
        layer.tile_location = TileLocation {
            index,
            row: index / chip_tile_cols,
            col: index % chip_tile_cols,
        };
        index += layer.num_tiles();
        mapped += layer.num_tiles() as f64 * layer.utilization;
    }

    FloorPlan {
        layers,
        tile_size_cm,
        pe_size_cm,
        num_tile_cm,
        pe_size_nm,
        num_pe_nm: planner.num_pe_nm,
        num_tile_nm,
        chip_tile_rows,
        chip_tile_cols,
        chip_utilization: ratio(mapped, total as f64),
        max_layer_inputs: network
            .layers()
            .iter()
            .map(|l| l.input_height * l.input_width * l.input_channels)
            .max()
            .unwrap_or(0),
    }
}
