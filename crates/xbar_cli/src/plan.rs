//! `xbar plan`: prints the tile and PE layout chosen for a network.

use std::fmt::{self, Write};

use xbar_diagnostics::DiagnosticSink;
use xbar_estimate::{plan_chip, FloorPlan, MappingKind};

use crate::pipeline::{exit_code, load, load_params, render_diagnostics};
use crate::{GlobalArgs, PlanArgs, ReportFormat};

/// Runs the `xbar plan` command.
pub fn run(args: &PlanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();
    let params = load_params(global, args.precision, &sink)?;
    let network = load(&args.network, global)?;

    if !global.quiet {
        eprintln!("   Planning {} layers", network.len());
    }
    let plan = plan_chip(&network, &params, &sink);
    render_diagnostics(&sink, global);

    match args.format {
        ReportFormat::Text => {
            let mut out = String::new();
            render_plan(&plan, &mut out)?;
            print!("{out}");
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(exit_code(&sink))
}

pub(crate) fn mapping_name(mapping: MappingKind) -> &'static str {
    match mapping {
        MappingKind::Conventional => "conventional",
        MappingKind::Novel => "novel",
    }
}

/// Appends the floor plan to `out` as a text table.
pub fn render_plan(plan: &FloorPlan, out: &mut String) -> fmt::Result {
    writeln!(
        out,
        "chip: {}x{} tiles, utilization {:.1}%",
        plan.chip_tile_rows,
        plan.chip_tile_cols,
        plan.chip_utilization * 100.0
    )?;
    writeln!(
        out,
        "conventional tile: {} tiles of {} PEs, PE size {}",
        plan.num_tile_cm,
        plan.num_pe_cm(),
        plan.pe_size_cm
    )?;
    if plan.has_novel() {
        writeln!(
            out,
            "novel tile: {} tiles of {} PEs, PE size {}",
            plan.num_tile_nm, plan.num_pe_nm, plan.pe_size_nm
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{:>5}  {:<12}  {:>7}  {:>9}  {:>9}  {:>7}  {:>6}",
        "layer", "mapping", "tiles", "grid", "speed-up", "first", "util"
    )?;
    for (index, tiling) in plan.layers.iter().enumerate() {
        writeln!(
            out,
            "{:>5}  {:<12}  {:>7}  {:>9}  {:>9}  {:>7}  {:>5.1}%",
            index + 1,
            mapping_name(tiling.mapping),
            tiling.num_tiles(),
            format!("{}x{}", tiling.num_tile_row, tiling.num_tile_col),
            format!("{}x{}", tiling.speed_up_row, tiling.speed_up_col),
            tiling.tile_location.index,
            tiling.utilization * 100.0
        )?;
    }
    Ok(())
}
