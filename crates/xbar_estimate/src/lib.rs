//! Hierarchical latency, energy and area estimation for crossbar accelerators.
//!
//! The estimator walks the hardware hierarchy bottom-up. A subarray read cost
//! comes from an [`xbar_circuit::SubArrayModel`]; PEs combine subarrays, tiles
//! combine PEs, and the chip combines tiles layer by layer. Every level returns
//! a [`Performance`] value with an ADC/accumulation/other breakdown.
//!
//! # Usage
//!
//! ```ignore
//! use xbar_estimate::{plan_chip, ChipEstimator};
//!
//! let plan = plan_chip(&network, &params, &sink);
//! let chip = ChipEstimator::new(&params, plan);
//! let report = chip.estimate_network(&network, &traces, &sink)?;
//! println!("{:.3} TOPS/W", report.tops_per_watt);
//! ```
//!
//! # Architecture
//!
//! - [`resistance`]: per-column read resistance of a weight block
//! - [`perf`]: the latency/energy accumulator and its composition rules
//! - [`pe`]: processing element: subarray grid, adder tree, buffers, buses
//! - [`tile`]: tile: PE grid, accumulation, activation, buffers, H-tree
//! - [`floorplan`]: tile/PE sizing, mapping choice and duplication
//! - [`chip`]: global circuits and the layer-by-layer aggregation
//! - [`report`]: per-layer and chip results

#![warn(missing_docs)]

pub mod chip;
pub mod floorplan;
pub mod pe;
pub mod perf;
pub mod report;
pub mod resistance;
pub mod tile;

#[cfg(test)]
mod testing;

pub use chip::ChipEstimator;
pub use floorplan::{plan_chip, FloorPlan, MappingKind, TileLocation, TilingPlan};
pub use pe::{Duplication, PeEstimator};
pub use perf::{Breakdown, Bucket, Performance};
pub use report::{ChipReport, LayerReport};
pub use resistance::{ColumnResistanceResolver, CONDUCTANCE_FLOOR};
pub use tile::TileEstimator;
