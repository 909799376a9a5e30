//! Loading and quantising per-layer weight and input traces.
//!
//! A weight trace is a CSV with one line per logical weight row
//! (`input_channels × kernel_area`) and one real-valued weight in `[-1, 1]`
//! per output channel. An input trace has the same rows and one integer
//! activation in `[0, 2^input_bit)` per output position.

use crate::error::WorkloadError;
use crate::matrix::{InputMatrix, WeightMatrix};
use crate::network::LayerDescriptor;
use std::path::Path;
use xbar_config::Params;

/// The conductance and input matrices of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTrace {
    /// Conductance matrix, `weight_rows × weight_cols`.
    pub weights: WeightMatrix,
    /// Binary input matrix, `weight_rows × (positions × input_bit)`.
    pub inputs: InputMatrix,
}

/// Maps real weights in `[-1, 1]` to cell conductances.
///
/// Each weight is quantised to `synapse_bit` bits and split into
/// `num_col_per_synapse` digits of `cell_bit` bits, most significant first;
/// digit `d` programs the conductance `g_min + d / (2^cell_bit - 1) · (g_max - g_min)`.
pub fn quantize_weights(
    raw: &[Vec<f64>],
    synapse_bit: u32,
    cell_bit: u32,
    num_col_per_synapse: usize,
    g_min: f64,
    g_max: f64,
) -> WeightMatrix {
    let rows = raw.len();
    let logical_cols = raw.first().map_or(0, Vec::len);
    let cols = logical_cols * num_col_per_synapse;
    let max_level = ((1u64 << synapse_bit) - 1) as f64;
    let digit_mask = (1u64 << cell_bit) - 1;
    let digit_scale = digit_mask as f64;

    let mut data = Vec::with_capacity(rows * cols);
    for row in raw {
        for &w in row {
            let level = ((w.clamp(-1.0, 1.0) + 1.0) / 2.0 * max_level).round() as u64;
            for k in 0..num_col_per_synapse {
                let shift = cell_bit as usize * (num_col_per_synapse - 1 - k);
                let digit = (level >> shift) & digit_mask;
                data.push(g_min + digit as f64 / digit_scale * (g_max - g_min));
            }
        }
    }
    WeightMatrix::from_vec(rows, cols, data)
        .unwrap_or_else(|| WeightMatrix::filled(rows, cols, g_min))
}

fn parse_grid(content: &str, what: &str) -> Result<Vec<Vec<f64>>, WorkloadError> {
    let mut grid: Vec<Vec<f64>> = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(',')
            .map(|cell| {
                cell.trim().parse::<f64>().map_err(|_| WorkloadError::Parse {
                    line: idx + 1,
                    message: format!("'{}' is not a number in the {what} trace", cell.trim()),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        if let Some(first) = grid.first() {
            if first.len() != row.len() {
                return Err(WorkloadError::ShapeMismatch {
                    what: format!("{what} trace line {} columns", idx + 1),
                    expected: first.len(),
                    found: row.len(),
                });
            }
        }
        grid.push(row);
    }
    Ok(grid)
}

fn check_rows(
    layer_index: usize,
    what: &str,
    expected: usize,
    found: usize,
) -> Result<(), WorkloadError> {
    if expected != found {
        return Err(WorkloadError::ShapeMismatch {
            what: format!("layer {layer_index} {what} rows"),
            expected,
            found,
        });
    }
    Ok(())
}

/// Parses a weight trace for a layer and quantises it to conductances.
pub fn parse_weight_trace(
    content: &str,
    layer_index: usize,
    layer: &LayerDescriptor,
    params: &Params,
) -> Result<WeightMatrix, WorkloadError> {
    let raw = parse_grid(content, "weight")?;
    check_rows(layer_index, "weight", layer.logical_rows(), raw.len())?;
    let cols = raw.first().map_or(0, Vec::len);
    if cols != layer.output_channels {
        return Err(WorkloadError::ShapeMismatch {
            what: format!("layer {layer_index} weight columns"),
            expected: layer.output_channels,
            found: cols,
        });
    }
    Ok(quantize_weights(
        &raw,
        params.synapse_bit,
        params.cell_bit,
        params.num_col_per_synapse,
        params.min_conductance,
        params.max_conductance,
    ))
}

/// Parses an input trace for a layer and expands activations into bit vectors.
pub fn parse_input_trace(
    content: &str,
    layer_index: usize,
    layer: &LayerDescriptor,
    input_bit: u32,
) -> Result<InputMatrix, WorkloadError> {
    let raw = parse_grid(content, "input")?;
    check_rows(layer_index, "input", layer.logical_rows(), raw.len())?;
    let positions = raw.first().map_or(0, Vec::len);
    if positions == 0 {
        return Err(WorkloadError::ShapeMismatch {
            what: format!("layer {layer_index} input positions"),
            expected: layer.output_positions(),
            found: 0,
        });
    }
    let max_value = ((1u64 << input_bit) - 1) as f64;
    let bits = input_bit as usize;
    let vectors = positions * bits;
    let mut data = Vec::with_capacity(raw.len() * vectors);
    for (r, row) in raw.iter().enumerate() {
        for &value in row {
            if value < 0.0 || value > max_value || value.fract() != 0.0 {
                return Err(WorkloadError::Parse {
                    line: r + 1,
                    message: format!(
                        "input activation {value} is not an integer in [0, {max_value}]"
                    ),
                });
            }
            let value = value as u64;
            for bit in 0..bits {
                data.push(((value >> bit) & 1) as u8);
            }
        }
    }
    InputMatrix::from_vec(raw.len(), vectors, data).ok_or_else(|| WorkloadError::ShapeMismatch {
        what: format!("layer {layer_index} input bits"),
        expected: raw.len() * vectors,
        found: 0,
    })
}

/// Reads a weight trace file.
pub fn load_weight_trace(
    path: &Path,
    layer_index: usize,
    layer: &LayerDescriptor,
    params: &Params,
) -> Result<WeightMatrix, WorkloadError> {
    let content = std::fs::read_to_string(path).map_err(|e| WorkloadError::io(path, e))?;
    parse_weight_trace(&content, layer_index, layer, params)
}

/// Reads an input trace file.
pub fn load_input_trace(
    path: &Path,
    layer_index: usize,
    layer: &LayerDescriptor,
    input_bit: u32,
) -> Result<InputMatrix, WorkloadError> {
    let content = std::fs::read_to_string(path).map_err(|e| WorkloadError::io(path, e))?;
    parse_input_trace(&content, layer_index, layer, input_bit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbar_config::{resolve_params, ParamConfig, Precision};
    use xbar_diagnostics::DiagnosticSink;

    fn params(synapse_bit: u32, input_bit: u32) -> Params {
        resolve_params(
            &ParamConfig::default(),
            Precision::new(synapse_bit, input_bit),
            &DiagnosticSink::new(),
        )
        .unwrap()
    }

    fn layer(c: usize, k: usize, m: usize) -> LayerDescriptor {
        LayerDescriptor {
            input_height: 4,
            input_width: 4,
            input_channels: c,
            kernel_height: k,
            kernel_width: k,
            output_channels: m,
            pooling: false,
        }
    }

    #[test]
    fn quantize_splits_digits_msb_first() {
        // 4-bit synapse, 2-bit cells: +1 -> 15 -> digits 3,3; -1 -> 0 -> digits 0,0
        let m = quantize_weights(&[vec![1.0, -1.0]], 4, 2, 2, 0.0, 3.0);
        assert_eq!(m.cols(), 4);
        assert_eq!(m.row(0), &[3.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn quantize_mid_level() {
        // 0.0 -> round(7.5) = 8 = 0b10_00
        let m = quantize_weights(&[vec![0.0]], 4, 2, 2, 0.0, 3.0);
        assert_eq!(m.row(0), &[2.0, 0.0]);
    }

    #[test]
    fn quantize_maps_to_conductance_range() {
        let p = params(8, 8);
        let m = quantize_weights(&[vec![1.0]], 8, 2, 4, p.min_conductance, p.max_conductance);
        for c in 0..4 {
            assert!((m.get(0, c) - p.max_conductance).abs() < 1e-15);
        }
    }

    #[test]
    fn weight_trace_shape_is_checked() {
        let p = params(8, 8);
        let l = layer(1, 2, 2);
        let ok = "0.1,0.2\n-0.5,0.5\n0,0\n1,-1\n";
        let m = parse_weight_trace(ok, 1, &l, &p).unwrap();
        assert_eq!((m.rows(), m.cols()), (4, 8));

        let short = "0.1,0.2\n-0.5,0.5\n";
        assert!(matches!(
            parse_weight_trace(short, 1, &l, &p).unwrap_err(),
            WorkloadError::ShapeMismatch { expected: 4, found: 2, .. }
        ));

        let ragged = "0.1,0.2\n-0.5\n0,0\n1,-1\n";
        assert!(matches!(
            parse_weight_trace(ragged, 1, &l, &p).unwrap_err(),
            WorkloadError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn input_trace_expands_bits() {
        let l = layer(2, 1, 1);
        let m = parse_input_trace("3,0\n1,2\n", 1, &l, 2).unwrap();
        assert_eq!((m.rows(), m.vectors()), (2, 4));
        // row 0: 3 -> bits 1,1 ; 0 -> 0,0
        assert_eq!(m.vector(0), vec![1, 1]);
        assert_eq!(m.vector(1), vec![1, 0]);
        assert_eq!(m.vector(3), vec![0, 1]);
    }

    #[test]
    fn input_out_of_range_rejected() {
        let l = layer(1, 1, 1);
        assert!(parse_input_trace("4\n", 1, &l, 2).is_err());
        assert!(parse_input_trace("0.5\n", 1, &l, 2).is_err());
    }

    #[test]
    fn load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let w = dir.path().join("w.csv");
        let i = dir.path().join("i.csv");
        std::fs::write(&w, "0.5\n").unwrap();
        std::fs::write(&i, "1,0,1\n").unwrap();
        let l = layer(1, 1, 1);
        let p = params(8, 1);
        assert_eq!(load_weight_trace(&w, 1, &l, &p).unwrap().cols(), 4);
        assert_eq!(load_input_trace(&i, 1, &l, 1).unwrap().vectors(), 3);
    }
}
