//! First-order circuit models for compute-in-memory accelerators.
//!
//! The estimation engine treats every circuit block as an opaque cost function.
//! This crate provides those functions: the [`SubArrayModel`] trait with its
//! analytic [`CrossbarSubArray`] implementation, and the peripheral blocks
//! (adder trees, register and SRAM buffers, buses, H-trees, activation and
//! pooling units) that the PE, tile and chip levels instantiate.
//!
//! All models are immutable after construction: cost methods take `&self` and
//! return the cost by value.
//!
//! ```
//! use xbar_circuit::{build_subarray, Technology};
//! use xbar_config::{resolve_params, ParamConfig, Precision};
//! use xbar_diagnostics::DiagnosticSink;
//!
//! let sink = DiagnosticSink::new();
//! let params = resolve_params(&ParamConfig::default(), Precision::new(8, 8), &sink).unwrap();
//! let subarray = build_subarray(&params);
//! assert_eq!(subarray.rows(), 128);
//! assert!(subarray.area().area > 0.0);
//! ```

#![warn(missing_docs)]

pub mod activation;
pub mod adder_tree;
pub mod buffer;
pub mod bus;
pub mod cost;
pub mod htree;
pub mod maxpool;
pub mod register;
pub mod subarray;
pub mod technology;

pub use activation::{ActivationUnit, BitShifter, Sigmoid};
pub use adder_tree::AdderTree;
pub use buffer::Buffer;
pub use bus::{Bus, BusOrientation};
pub use cost::{AreaBreakdown, BufferCost, ModuleCost, SubArrayCost};
pub use htree::HTree;
pub use maxpool::MaxPool;
pub use register::RegisterBuffer;
pub use subarray::CrossbarSubArray;
pub use technology::{LogicCell, StdCell, Technology};

use xbar_config::Params;

/// The cost model of one memory subarray.
///
/// A subarray turns a vector of per-column resistances (the analog state of one
/// read) into latency and energy. The estimation engine never looks inside:
/// any implementation with the same signature can be substituted.
pub trait SubArrayModel: std::fmt::Debug {
    /// Number of wordlines.
    fn rows(&self) -> usize;

    /// Number of bitlines.
    fn cols(&self) -> usize;

    /// Cost of reading one input vector.
    ///
    /// `column_resistance` has one entry per bitline; `activity_row_read` is the
    /// fraction of rows driven by the input; `level_output` is the number of
    /// levels the ADC must resolve.
    fn calculate(
        &self,
        column_resistance: &[f64],
        activity_row_read: f64,
        level_output: usize,
    ) -> SubArrayCost;

    /// Area breakdown of one subarray including its periphery.
    fn area(&self) -> AreaBreakdown;

    /// Static leakage power (W).
    fn leakage(&self) -> f64;
}

/// Builds the analytic subarray model for a parameter store.
pub fn build_subarray(params: &Params) -> Box<dyn SubArrayModel> {
    Box::new(CrossbarSubArray::new(params, Technology::from_params(params)))
}
