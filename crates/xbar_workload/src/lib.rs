//! Network descriptors and weight/input traces for the estimator.
//!
//! A [`Network`] is the ordered list of layer shapes read from a CSV file. For
//! every layer the estimator needs a conductance [`WeightMatrix`] and a binary
//! [`InputMatrix`], either loaded from trace files or generated synthetically
//! from a seed.

#![warn(missing_docs)]

pub mod error;
pub mod matrix;
pub mod network;
pub mod synthetic;
pub mod trace;

pub use error::WorkloadError;
pub use matrix::{InputMatrix, WeightMatrix};
pub use network::{load_network, LayerDescriptor, Network};
pub use synthetic::synthetic_layer;
pub use trace::{
    load_input_trace, load_weight_trace, parse_input_trace, parse_weight_trace, quantize_weights,
    LayerTrace,
};
