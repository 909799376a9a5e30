//! Shared foundational types used across the xbarsim estimator.
//!
//! This crate provides the internal error type, clock frequency values and the
//! small integer helpers every level of the hierarchy uses to size partitions.

#![warn(missing_docs)]

pub mod frequency;
pub mod math;
pub mod result;

pub use frequency::{Frequency, ParseFrequencyError};
pub use math::{ceil_div, ceil_sqrt, floor_ratio_at_least_one, log2_ceil};
pub use result::{InternalError, XbarResult};
