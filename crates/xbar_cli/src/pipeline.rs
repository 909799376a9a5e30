//! Shared steps of the CLI commands: parameter resolution, network loading
//! and diagnostic rendering.

use std::path::Path;

use xbar_config::{load_config, load_config_file, resolve_params, Params, Precision};
use xbar_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use xbar_workload::{load_network, Network};

use crate::{GlobalArgs, PrecisionArgs};

/// Resolves the parameter store.
///
/// `--config` names the parameter file; without it `xbar.toml` is looked up
/// in the current directory, and reference defaults are used if it is absent.
pub fn load_params(
    global: &GlobalArgs,
    precision: PrecisionArgs,
    sink: &DiagnosticSink,
) -> Result<Params, Box<dyn std::error::Error>> {
    let config = match &global.config {
        Some(path) => load_config_file(Path::new(path))?,
        None => load_config(&std::env::current_dir()?)?,
    };
    let params = resolve_params(
        &config,
        Precision::new(precision.weight_bits, precision.input_bits),
        sink,
    )?;
    if global.verbose {
        eprintln!(
            "   Parameters {}x{} subarrays, {} nm, {} bit cells, {} columns per synapse",
            params.num_row_subarray,
            params.num_col_subarray,
            params.technology.node,
            params.cell_bit,
            params.num_col_per_synapse
        );
    }
    Ok(params)
}

/// Loads the network description.
pub fn load(path: &Path, global: &GlobalArgs) -> Result<Network, Box<dyn std::error::Error>> {
    let network = load_network(path)?;
    if !global.quiet {
        eprintln!("     Loaded {} ({} layers)", path.display(), network.len());
    }
    Ok(network)
}

/// Prints collected diagnostics to stderr.
///
/// Quiet mode shows errors only; notes and help need `--verbose`.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    for diag in sink.at_least(Severity::threshold(global.quiet, global.verbose)) {
        eprintln!("{}", renderer.render(&diag));
    }
}

/// Exit status for a finished command.
pub fn exit_code(sink: &DiagnosticSink) -> i32 {
    if sink.has_errors() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config,
        }
    }

    const PRECISION: PrecisionArgs = PrecisionArgs {
        weight_bits: 8,
        input_bits: 8,
    };

    #[test]
    fn explicit_config_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[subarray]\nrows = 64\ncols = 64\n").unwrap();
        let sink = DiagnosticSink::new();

        let global = global(Some(path.display().to_string()));
        let params = load_params(&global, PRECISION, &sink).unwrap();
        assert_eq!(params.num_row_subarray, 64);
        assert_eq!(params.num_col_subarray, 64);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[cell]\ntype = \"pcm\"\n").unwrap();
        let sink = DiagnosticSink::new();
        assert!(load_params(&global(Some(path.display().to_string())), PRECISION, &sink).is_err());
    }

    #[test]
    fn missing_network_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("none.csv"), &global(None)).is_err());
    }

    #[test]
    fn exit_code_follows_errors() {
        use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode};
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning(DiagnosticCode::new(Category::Config, 1), "corrected"));
        assert_eq!(exit_code(&sink), 0);
        sink.emit(Diagnostic::error(DiagnosticCode::new(Category::Error, 1), "broken"));
        assert_eq!(exit_code(&sink), 1);
    }
}
