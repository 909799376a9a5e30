//! Network descriptors parsed from CSV.
//!
//! Each non-empty line describes one layer:
//! `input_height, input_width, input_channels, kernel_height, kernel_width,
//! output_channels, followed_by_pooling`. Fully connected layers use a 1×1
//! input and kernel. Lines starting with `#` are comments; trailing columns
//! beyond the seventh are ignored.

use crate::error::WorkloadError;
use serde::Serialize;
use std::path::Path;

/// Shape of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerDescriptor {
    /// Input feature-map height.
    pub input_height: usize,
    /// Input feature-map width.
    pub input_width: usize,
    /// Input channels.
    pub input_channels: usize,
    /// Kernel height.
    pub kernel_height: usize,
    /// Kernel width.
    pub kernel_width: usize,
    /// Output channels.
    pub output_channels: usize,
    /// Whether a max-pooling stage follows this layer.
    pub pooling: bool,
}

impl LayerDescriptor {
    /// Kernel positions `kernel_height × kernel_width`.
    pub fn kernel_area(&self) -> usize {
        self.kernel_height * self.kernel_width
    }

    /// Rows of the unrolled weight matrix.
    pub fn weight_rows(&self, num_row_per_synapse: usize) -> usize {
        self.input_channels * self.kernel_area() * num_row_per_synapse
    }

    /// Columns of the unrolled weight matrix.
    pub fn weight_cols(&self, num_col_per_synapse: usize) -> usize {
        self.output_channels * num_col_per_synapse
    }

    /// Logical weight rows before the per-synapse expansion.
    pub fn logical_rows(&self) -> usize {
        self.weight_rows(1)
    }

    /// Number of output positions for a valid (unpadded, unit-stride) convolution.
    pub fn output_positions(&self) -> usize {
        (self.input_height - self.kernel_height + 1) * (self.input_width - self.kernel_width + 1)
    }

    /// Operation count used for energy efficiency.
    pub fn num_computation(&self) -> f64 {
        (self.input_height
            * self.input_width
            * self.input_channels
            * self.kernel_height
            * self.kernel_width
            * self.output_channels) as f64
    }
}

/// An ordered, immutable list of layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Network {
    layers: Vec<LayerDescriptor>,
}

impl Network {
    /// Creates a network from validated layers.
    pub fn new(layers: Vec<LayerDescriptor>) -> Result<Self, WorkloadError> {
        if layers.is_empty() {
            return Err(WorkloadError::EmptyNetwork);
        }
        for (i, layer) in layers.iter().enumerate() {
            validate_layer(i + 1, layer)?;
        }
        Ok(Self { layers })
    }

    /// Parses the CSV description.
    pub fn from_csv_str(content: &str) -> Result<Self, WorkloadError> {
        let mut layers = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() < 7 {
                return Err(WorkloadError::MissingColumns {
                    line: idx + 1,
                    found: cells.len(),
                });
            }
            let mut values = [0usize; 7];
            for (slot, cell) in values.iter_mut().zip(&cells) {
                *slot = parse_count(cell).ok_or_else(|| WorkloadError::Parse {
                    line: idx + 1,
                    message: format!("'{cell}' is not a non-negative integer"),
                })?;
            }
            layers.push(LayerDescriptor {
                input_height: values[0],
                input_width: values[1],
                input_channels: values[2],
                kernel_height: values[3],
                kernel_width: values[4],
                output_channels: values[5],
                pooling: values[6] != 0,
            });
        }
        Self::new(layers)
    }

    /// The layers in execution order.
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always `false`; an empty network cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total operation count over all layers.
    pub fn num_computation(&self) -> f64 {
        self.layers.iter().map(LayerDescriptor::num_computation).sum()
    }
}

/// Accepts integers and integral floats such as `3.0`.
fn parse_count(cell: &str) -> Option<usize> {
    if let Ok(v) = cell.parse::<usize>() {
        return Some(v);
    }
    let v: f64 = cell.parse().ok()?;
    (v >= 0.0 && v.fract() == 0.0 && v.is_finite()).then_some(v as usize)
}

fn validate_layer(index: usize, layer: &LayerDescriptor) -> Result<(), WorkloadError> {
    let invalid = |message: &str| WorkloadError::InvalidLayer {
        layer: index,
        message: message.to_string(),
    };
    if layer.input_height == 0
        || layer.input_width == 0
        || layer.input_channels == 0
        || layer.kernel_height == 0
        || layer.kernel_width == 0
        || layer.output_channels == 0
    {
        return Err(invalid("all dimensions must be positive"));
    }
    if layer.kernel_height > layer.input_height || layer.kernel_width > layer.input_width {
        return Err(invalid("kernel is larger than the input feature map"));
    }
    Ok(())
}

/// Reads and parses a network description file.
pub fn load_network(path: &Path) -> Result<Network, WorkloadError> {
    let content = std::fs::read_to_string(path).map_err(|e| WorkloadError::io(path, e))?;
    Network::from_csv_str(&content)
}
