//! Parsing, validation and resolution of `xbar.toml` parameter files.
//!
//! This crate reads the accelerator parameter file into a strongly-typed
//! [`ParamConfig`] and resolves it, together with the run's [`Precision`], into
//! the immutable [`Params`] store every estimator reads. Inconsistent values are
//! corrected during resolution and reported as diagnostics; unsupported discrete
//! values are fatal.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{
    resolve_params, Params, Precision, WireResistance, MAX_PRECISION_BITS, SUPPORTED_NODES,
};
pub use types::*;
