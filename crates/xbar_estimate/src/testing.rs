//! Test doubles shared by the unit tests.

use std::cell::Cell;
use std::rc::Rc;
use xbar_circuit::{AreaBreakdown, SubArrayCost, SubArrayModel};
use xbar_config::{resolve_params, ParamConfig, Params, Precision};
use xbar_diagnostics::DiagnosticSink;

/// Default parameters at 8-bit weights and inputs.
pub fn default_params() -> Params {
    resolve_params(&ParamConfig::default(), Precision::new(8, 8), &DiagnosticSink::new()).unwrap()
}

/// A subarray returning a fixed cost and counting its reads.
#[derive(Debug)]
pub struct CountingSubArray {
    rows: usize,
    cols: usize,
    calls: Rc<Cell<usize>>,
}

impl CountingSubArray {
    pub const COST: SubArrayCost = SubArrayCost {
        latency_adc: 1e-9,
        latency_accumulation: 0.5e-9,
        latency_other: 0.5e-9,
        energy_adc: 1e-12,
        energy_accumulation: 1e-12,
        energy_other: 1e-12,
    };

    pub fn new(rows: usize, cols: usize) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                rows,
                cols,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl SubArrayModel for CountingSubArray {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn calculate(&self, _: &[f64], _: f64, _: usize) -> SubArrayCost {
        self.calls.set(self.calls.get() + 1);
        Self::COST
    }

    fn area(&self) -> AreaBreakdown {
        AreaBreakdown {
            height: 1e-5,
            width: 1e-5,
            area: 1e-10,
            ic: 0.0,
            adc: 4e-11,
            accumulation: 2e-11,
            other: 4e-11,
        }
    }

    fn leakage(&self) -> f64 {
        1e-6
    }
}
