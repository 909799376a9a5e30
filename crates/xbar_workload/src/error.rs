//! Error types for network and trace loading.

use std::path::PathBuf;

/// Errors that can occur when reading a network description or a layer trace.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A CSV cell is not a number.
    #[error("line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A network row has fewer than the required columns.
    #[error("line {line}: expected at least 7 columns, found {found}")]
    MissingColumns {
        /// One-based line number.
        line: usize,
        /// Columns present.
        found: usize,
    },

    /// A layer shape is degenerate.
    #[error("layer {layer}: {message}")]
    InvalidLayer {
        /// One-based layer index.
        layer: usize,
        /// What went wrong.
        message: String,
    },

    /// A trace does not match its layer descriptor.
    #[error("{what}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Which dimension disagreed.
        what: String,
        /// The size the layer requires.
        expected: usize,
        /// The size the trace has.
        found: usize,
    },

    /// The network has no layers.
    #[error("network description contains no layers")]
    EmptyNetwork,
}

impl WorkloadError {
    /// Wraps an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkloadError::Io {
            path: path.into(),
            source,
        }
    }
}
