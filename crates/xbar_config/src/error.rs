//! Error types for parameter loading and resolution.

/// Errors that can occur when loading or resolving an `xbar.toml` parameter file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the parameter file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed, including unknown enum variants.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A discrete parameter has a value the models have no data for.
    #[error("unsupported {what}: {value}")]
    Unsupported {
        /// The parameter name, e.g. `"wire width"`.
        what: &'static str,
        /// The offending value as written.
        value: String,
    },

    /// A parameter value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unsupported() {
        let err = ConfigError::Unsupported {
            what: "wire width",
            value: "45".to_string(),
        };
        assert_eq!(format!("{err}"), "unsupported wire width: 45");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("unknown variant `pcm`".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: unknown variant `pcm`"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read configuration:"));
    }
}
