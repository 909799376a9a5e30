//! Per-column effective resistance of a subarray read.

use xbar_circuit::Technology;
use xbar_config::{CellConfig, Params};
use xbar_workload::WeightMatrix;

/// Conductance of an undriven row, and the starting conductance of a column (S).
pub const CONDUCTANCE_FLOOR: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CellPath {
    /// Resistive cell in series with its wire path and access device.
    Resistive { access: f64 },
    /// SRAM: the stored value does not change the read current.
    Sram { access: f64 },
}

/// Converts an input vector and a weight block into the column resistances a
/// subarray sees.
///
/// Each driven row adds the cell conductance in series with the wire path
/// `(j+1)·R_row + (n−i)·R_col` to the column total; undriven rows add
/// [`CONDUCTANCE_FLOOR`]. Sequential read averages over the driven rows.
#[derive(Debug, Clone)]
pub struct ColumnResistanceResolver {
    path: CellPath,
    wire_row: f64,
    wire_col: f64,
    parallel_read: bool,
}

impl ColumnResistanceResolver {
    /// Creates a resolver for the cell, wiring and read mode of a parameter store.
    pub fn new(params: &Params) -> Self {
        let path = match &params.cell {
            CellConfig::Sram(sram) => CellPath::Sram {
                access: Technology::from_params(params).on_resistance(sram.width_access),
            },
            // FeFET cells are their own access device.
            CellConfig::Rram(_) | CellConfig::Fefet(_) => CellPath::Resistive {
                access: params.access_resistance().unwrap_or(0.0),
            },
        };
        Self {
            path,
            wire_row: params.wire.row,
            wire_col: params.wire.col,
            parallel_read: params.parallel_read,
        }
    }

    /// Resolves one read. `input` has one bit per row of `weights`; extra rows
    /// on either side are ignored.
    pub fn resolve(&self, input: &[u8], weights: &WeightMatrix) -> Vec<f64> {
        let rows = weights.rows().min(input.len());
        (0..weights.cols())
            .map(|col| {
                let mut conductance = CONDUCTANCE_FLOOR;
                let mut activated = 0usize;
                for (row, &bit) in input.iter().enumerate().take(rows) {
                    if bit == 0 {
                        conductance += CONDUCTANCE_FLOOR;
                        continue;
                    }
                    activated += 1;
                    let wire =
                        (col + 1) as f64 * self.wire_row + (rows - row) as f64 * self.wire_col;
                    conductance += match self.path {
                        CellPath::Resistive { access } => {
                            series(weights.get(row, col), wire + access)
                        }
                        CellPath::Sram { access } => 1.0 / (wire + access),
                    };
                }
                if !self.parallel_read && activated > 0 {
                    conductance /= activated as f64;
                }
                1.0 / conductance
            })
            .collect()
    }
}

/// A cell conductance in series with a resistance.
fn series(conductance: f64, resistance: f64) -> f64 {
    if conductance <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 / conductance + resistance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbar_config::{load_config_from_str, resolve_params, ParamConfig, Precision};
    use xbar_diagnostics::DiagnosticSink;

    const NO_WIRE_NO_ACCESS: &str =
        concat!(
            "[technology]\nignore_wire_resistance = true\n",
            "[cell]\ntype = \"rram\"\naccess = { type = \"none\" }\n",
        );

    fn params(toml: &str) -> Params {
        let config = load_config_from_str(toml).unwrap();
        resolve_params(&config, Precision::new(8, 8), &DiagnosticSink::new()).unwrap()
    }

    fn default_params() -> Params {
        let sink = DiagnosticSink::new();
        resolve_params(&ParamConfig::default(), Precision::new(8, 8), &sink).unwrap()
    }

    #[test]
    fn undriven_columns_collapse_to_floor() {
        let resolver = ColumnResistanceResolver::new(&default_params());
        let weights = WeightMatrix::filled(16, 4, 1e-5);
        let resistance = resolver.resolve(&[0; 16], &weights);
        assert_eq!(resistance.len(), 4);
        let expected = 1.0 / (17.0 * CONDUCTANCE_FLOOR);
        for r in resistance {
            assert!((r - expected).abs() / expected < 1e-12);
        }
    }

    #[test]
    fn larger_conductance_never_raises_resistance() {
        let resolver = ColumnResistanceResolver::new(&default_params());
        let input = [1, 0, 1, 1, 0, 1, 1, 1];
        let ramp: Vec<f64> = (0..16).map(|v| 1e-7 * (v + 1) as f64).collect();
        let before = resolver.resolve(&input, &WeightMatrix::from_vec(8, 2, ramp.clone()).unwrap());

        for row in 0..8 {
            let mut data = ramp.clone();
            data[row * 2 + 1] *= 10.0;
            let after = resolver.resolve(&input, &WeightMatrix::from_vec(8, 2, data).unwrap());
            assert!(after[1] <= before[1], "row {row}: {} > {}", after[1], before[1]);
            assert_eq!(after[0], before[0]);
        }
    }

    #[test]
    fn parallel_read_sums_driven_rows() {
        let p = params(NO_WIRE_NO_ACCESS);
        let resolver = ColumnResistanceResolver::new(&p);
        let weights = WeightMatrix::filled(4, 1, 1e-5);
        let resistance = resolver.resolve(&[1, 1, 0, 1], &weights);
        let expected = 1.0 / (CONDUCTANCE_FLOOR * 2.0 + 3e-5);
        assert!((resistance[0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn sequential_read_averages_driven_rows() {
        let p = params(&format!("{NO_WIRE_NO_ACCESS}[subarray]\nmode = \"sequential\"\n"));
        let resolver = ColumnResistanceResolver::new(&p);
        let weights = WeightMatrix::filled(4, 1, 1e-5);
        let resistance = resolver.resolve(&[1, 1, 0, 1], &weights);
        let expected = 3.0 / (CONDUCTANCE_FLOOR * 2.0 + 3e-5);
        assert!((resistance[0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn access_transistor_adds_series_resistance() {
        let with_access = ColumnResistanceResolver::new(&default_params());
        let no_access = params("[cell]\ntype = \"rram\"\naccess = { type = \"none\" }\n");
        let without = ColumnResistanceResolver::new(&no_access);
        let weights = WeightMatrix::filled(4, 2, 1e-5);
        let a = with_access.resolve(&[1; 4], &weights);
        let b = without.resolve(&[1; 4], &weights);
        assert!(a[0] > b[0]);
    }

    #[test]
    fn far_columns_see_more_wire() {
        let resolver = ColumnResistanceResolver::new(&default_params());
        let weights = WeightMatrix::filled(8, 8, 1e-5);
        let resistance = resolver.resolve(&[1; 8], &weights);
        assert!(resistance[7] > resistance[0]);
    }

    #[test]
    fn sram_ignores_stored_value() {
        let resolver = ColumnResistanceResolver::new(&params("[cell]\ntype = \"sram\"\n"));
        let zeros = WeightMatrix::filled(8, 2, 0.0);
        let ones = WeightMatrix::filled(8, 2, 1.0);
        let input = [1, 0, 1, 0, 1, 0, 1, 0];
        assert_eq!(resolver.resolve(&input, &zeros), resolver.resolve(&input, &ones));
    }
}
