//! Deterministic synthetic traces for layers without trace files.

use crate::matrix::InputMatrix;
use crate::network::LayerDescriptor;
use crate::trace::{quantize_weights, LayerTrace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xbar_config::Params;

/// Generates a trace for one layer from a seed.
///
/// Weights are uniform in `[-1, 1]`; input bits are set with probability one
/// half. When `max_positions` is non-zero the number of output positions is
/// capped to bound memory on large feature maps.
pub fn synthetic_layer(
    layer: &LayerDescriptor,
    params: &Params,
    seed: u64,
    max_positions: usize,
) -> LayerTrace {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = layer.logical_rows();

    let raw: Vec<Vec<f64>> = (0..rows)
        .map(|_| {
            (0..layer.output_channels)
                .map(|_| rng.gen_range(-1.0..=1.0))
                .collect()
        })
        .collect();
    let weights = quantize_weights(
        &raw,
        params.synapse_bit,
        params.cell_bit,
        params.num_col_per_synapse,
        params.min_conductance,
        params.max_conductance,
    );

    let mut positions = layer.output_positions();
    if max_positions > 0 {
        positions = positions.min(max_positions);
    }
    let vectors = positions * params.input_bit as usize;
    let bits: Vec<u8> = (0..rows * vectors).map(|_| u8::from(rng.gen_bool(0.5))).collect();
    let inputs = InputMatrix::from_vec(rows, vectors, bits)
        .unwrap_or_else(|| InputMatrix::filled(rows, vectors, false));

    LayerTrace { weights, inputs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbar_config::{resolve_params, ParamConfig, Precision};
    use xbar_diagnostics::DiagnosticSink;

    fn params() -> Params {
        let sink = DiagnosticSink::new();
        resolve_params(&ParamConfig::default(), Precision::new(8, 4), &sink).unwrap()
    }

    fn conv() -> LayerDescriptor {
        LayerDescriptor {
            input_height: 6,
            input_width: 6,
            input_channels: 4,
            kernel_height: 3,
            kernel_width: 3,
            output_channels: 8,
            pooling: false,
        }
    }

    #[test]
    fn shapes_follow_layer() {
        let trace = synthetic_layer(&conv(), &params(), 7, 0);
        assert_eq!(trace.weights.rows(), 36);
        assert_eq!(trace.weights.cols(), 32);
        assert_eq!(trace.inputs.rows(), 36);
        assert_eq!(trace.inputs.vectors(), 16 * 4);
    }

    #[test]
    fn same_seed_same_trace() {
        let a = synthetic_layer(&conv(), &params(), 42, 0);
        let b = synthetic_layer(&conv(), &params(), 42, 0);
        assert_eq!(a, b);
        let c = synthetic_layer(&conv(), &params(), 43, 0);
        assert_ne!(a, c);
    }

    #[test]
    fn positions_can_be_capped() {
        let trace = synthetic_layer(&conv(), &params(), 1, 3);
        assert_eq!(trace.inputs.vectors(), 12);
    }

    #[test]
    fn conductances_within_bounds() {
        let p = params();
        let trace = synthetic_layer(&conv(), &p, 3, 0);
        for r in 0..trace.weights.rows() {
            for &g in trace.weights.row(r) {
                assert!(g >= p.min_conductance - 1e-18 && g <= p.max_conductance + 1e-18);
            }
        }
    }
}
