//! Parameter file loading and validation.

use crate::error::ConfigError;
use crate::types::ParamConfig;
use std::path::Path;

/// File name looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "xbar.toml";

/// Loads and validates `xbar.toml` from a directory.
///
/// A directory without a parameter file yields the reference defaults.
pub fn load_config(dir: &Path) -> Result<ParamConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(ParamConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates an explicit parameter file path.
pub fn load_config_file(path: &Path) -> Result<ParamConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates parameter TOML from a string.
pub fn load_config_from_str(content: &str) -> Result<ParamConfig, ConfigError> {
    let config: ParamConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges that no correction can repair.
fn validate_config(config: &ParamConfig) -> Result<(), ConfigError> {
    let sub = &config.subarray;
    if sub.rows == 0 || sub.cols == 0 {
        return Err(ConfigError::ValidationError(
            "subarray rows and cols must be positive".to_string(),
        ));
    }
    if sub.num_col_muxed == 0 {
        return Err(ConfigError::ValidationError(
            "subarray.num_col_muxed must be positive".to_string(),
        ));
    }
    if sub.level_output < 2 {
        return Err(ConfigError::ValidationError(
            "subarray.level_output must be at least 2".to_string(),
        ));
    }
    if sub.cell_bit == 0 {
        return Err(ConfigError::ValidationError(
            "subarray.cell_bit must be positive".to_string(),
        ));
    }
    if let Some(cell) = config.cell.nvm() {
        if !(cell.resistance_on > 0.0 && cell.resistance_on < cell.resistance_off) {
            return Err(ConfigError::ValidationError(format!(
                "cell resistances must satisfy 0 < resistance_on < resistance_off (got {} and {})",
                cell.resistance_on, cell.resistance_off
            )));
        }
        if cell.read_pulse_width <= 0.0 || cell.read_voltage <= 0.0 {
            return Err(ConfigError::ValidationError(
                "cell read voltage and pulse width must be positive".to_string(),
            ));
        }
    }
    if config.chip.tree_folded_ratio == 0 || config.chip.max_global_bus_width == 0 {
        return Err(ConfigError::ValidationError(
            "chip.tree_folded_ratio and chip.max_global_bus_width must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessDevice, CellConfig, ReadMode};

    #[test]
    fn empty_file_is_reference_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.subarray.rows, 128);
        assert_eq!(config.subarray.num_col_muxed, 8);
        assert_eq!(config.subarray.level_output, 16);
        assert_eq!(config.subarray.cell_bit, 2);
        assert_eq!(config.technology.node, 32);
        assert_eq!(config.chip.clock, "1GHz");
        assert!(config.chip.chip_activation);
        assert!(!config.chip.novel_mapping);
        assert!(matches!(config.cell, CellConfig::Rram(_)));
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cell]
type = "fefet"
resistance_on = 240e3
resistance_off = 24e6
access = { type = "none" }

[subarray]
rows = 256
cols = 256
num_col_muxed = 16
cell_bit = 1
mode = "sequential"

[technology]
node = 22
transistor = "tfet"
roadmap = "lstp"
wire_width = 22

[chip]
clock = "500MHz"
chip_activation = false
activation = "sigmoid"
novel_mapping = true
buffer = "register_file"
"#;
        let config = load_config_from_str(toml).unwrap();
        let cell = config.cell.nvm().unwrap();
        assert_eq!(cell.resistance_on, 240e3);
        assert_eq!(cell.access, AccessDevice::None);
        assert!(matches!(config.cell, CellConfig::Fefet(_)));
        assert_eq!(config.subarray.rows, 256);
        assert_eq!(config.subarray.mode, ReadMode::Sequential);
        assert_eq!(config.technology.node, 22);
        assert!(!config.chip.chip_activation);
        assert!(config.chip.novel_mapping);
        assert_eq!(config.chip.buffer, crate::types::BufferKind::RegisterFile);
    }

    #[test]
    fn sram_cell_defaults() {
        let config = load_config_from_str("[cell]\ntype = \"sram\"\n").unwrap();
        assert!(config.cell.is_sram());
        assert_eq!(config.cell.footprint(), (7.69, 23.23));
    }

    #[test]
    fn cmos_access_defaults() {
        let config = load_config_from_str(
            "[cell]\ntype = \"rram\"\naccess = { type = \"cmos\" }\n",
        )
        .unwrap();
        match &config.cell.nvm().unwrap().access {
            AccessDevice::Cmos {
                resistance,
                gate_voltage,
            } => {
                assert_eq!(*resistance, 15e3);
                assert_eq!(*gate_voltage, 0.1);
            }
            other => panic!("expected cmos access, got {other:?}"),
        }
    }

    #[test]
    fn unknown_cell_type_is_fatal() {
        let err = load_config_from_str("[cell]\ntype = \"pcm\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_roadmap_is_fatal() {
        let err = load_config_from_str("[technology]\nroadmap = \"lop\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn inverted_resistances_rejected() {
        let toml = "[cell]\ntype = \"rram\"\nresistance_on = 1e6\nresistance_off = 1e5\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_mux_rejected() {
        let err = load_config_from_str("[subarray]\nnum_col_muxed = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.subarray.cols, 128);
    }

    #[test]
    fn loads_file_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[subarray]\nrows = 64\ncols = 64\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.subarray.rows, 64);
    }

    #[test]
    fn explicit_missing_file_is_io_error() {
        let err = load_config_file(Path::new("/nonexistent/xbar.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
