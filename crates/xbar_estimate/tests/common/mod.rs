//! Shared helpers for the estimator integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use xbar_circuit::{AreaBreakdown, SubArrayCost, SubArrayModel};
use xbar_config::{load_config_from_str, resolve_params, ParamConfig, Params, Precision};
use xbar_diagnostics::DiagnosticSink;
use xbar_workload::Network;

/// The fixed cost every [`FixedSubArray`] read returns.
pub const READ: SubArrayCost = SubArrayCost {
    latency_adc: 4e-9,
    latency_accumulation: 1e-9,
    latency_other: 3e-9,
    energy_adc: 2e-12,
    energy_accumulation: 1e-12,
    energy_other: 1e-12,
};

/// A subarray with a fixed read cost that counts its reads.
#[derive(Debug)]
pub struct FixedSubArray {
    size: usize,
    reads: Rc<Cell<usize>>,
}

impl FixedSubArray {
    pub fn new(size: usize) -> (Self, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        (Self { size, reads: Rc::clone(&reads) }, reads)
    }
}

impl SubArrayModel for FixedSubArray {
    fn rows(&self) -> usize {
        self.size
    }

    fn cols(&self) -> usize {
        self.size
    }

    fn calculate(&self, _: &[f64], _: f64, _: usize) -> SubArrayCost {
        self.reads.set(self.reads.get() + 1);
        READ
    }

    fn area(&self) -> AreaBreakdown {
        AreaBreakdown {
            height: 2e-5,
            width: 2e-5,
            area: 4e-10,
            ic: 0.0,
            adc: 2e-10,
            accumulation: 1e-10,
            other: 1e-10,
        }
    }

    fn leakage(&self) -> f64 {
        2e-6
    }
}

/// Reference parameters at the given precision.
pub fn params(synapse_bit: u32, input_bit: u32) -> Params {
    let precision = Precision::new(synapse_bit, input_bit);
    resolve_params(&ParamConfig::default(), precision, &DiagnosticSink::new()).unwrap()
}

/// Parameters from a TOML snippet at 8-bit precision.
pub fn params_from(toml: &str) -> Params {
    let config = load_config_from_str(toml).unwrap();
    resolve_params(&config, Precision::new(8, 8), &DiagnosticSink::new()).unwrap()
}

/// A small VGG-style network.
pub fn vgg_like() -> Network {
    Network::from_csv_str(
        "32,32,3,3,3,64,0\n\
         32,32,64,3,3,64,1\n\
         16,16,64,3,3,128,0\n\
         16,16,128,3,3,128,1\n\
         1,1,8192,1,1,256,0\n\
         1,1,256,1,1,10,0\n",
    )
    .unwrap()
}
