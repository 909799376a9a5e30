//! `xbar estimate`: the full estimation pipeline.
//!
//! 1. Resolve parameters (`--config`, else `xbar.toml`, else defaults)
//! 2. Load the network and plan the chip
//! 3. For each layer, load its trace files or generate a synthetic trace
//! 4. Estimate the layer and print a progress line
//! 5. Total the layers, render diagnostics and print the report

use std::fmt::{self, Write};
use std::path::PathBuf;

use xbar_config::Params;
use xbar_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use xbar_estimate::{plan_chip, Breakdown, ChipEstimator, ChipReport};
use xbar_workload::{
    load_input_trace, load_weight_trace, synthetic_layer, LayerDescriptor, LayerTrace,
};

use crate::pipeline::{exit_code, load, load_params, render_diagnostics};
use crate::plan::mapping_name;
use crate::{EstimateArgs, GlobalArgs, ReportFormat};

/// Runs the `xbar estimate` command.
///
/// Returns exit code 0 if no errors were reported, 1 otherwise.
pub fn run(args: &EstimateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();
    let params = load_params(global, args.precision, &sink)?;
    let network = load(&args.network, global)?;

    let pairs = args.trace_pairs();
    if pairs.len() > network.len() {
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 1),
                format!("{} trace pairs given for {} layers", pairs.len(), network.len()),
            )
            .with_note("the extra pairs are ignored"),
        );
    }

    let plan = plan_chip(&network, &params, &sink);
    let chip = ChipEstimator::new(&params, plan);

    let mut layers = Vec::with_capacity(network.len());
    for (index, layer) in network.layers().iter().enumerate() {
        let trace = layer_trace(args, &params, index, layer, pairs.get(index))?;
        let report = chip.estimate_layer(index, layer, &trace.weights, &trace.inputs, &sink)?;
        if !global.quiet {
            eprintln!(
                "  Estimated layer {}/{} ({}, {} tiles) {:.3} ns",
                index + 1,
                network.len(),
                mapping_name(report.mapping),
                report.num_tiles,
                report.performance.read_latency * 1e9
            );
        }
        layers.push(report);
    }
    let report = chip.summarize(layers);

    render_diagnostics(&sink, global);
    match args.format {
        ReportFormat::Text => {
            let mut out = String::new();
            render_report(&report, &mut out)?;
            print!("{out}");
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(exit_code(&sink))
}

fn layer_trace(
    args: &EstimateArgs,
    params: &Params,
    index: usize,
    layer: &LayerDescriptor,
    files: Option<&(PathBuf, PathBuf)>,
) -> Result<LayerTrace, Box<dyn std::error::Error>> {
    Ok(match files {
        Some((weights, inputs)) => LayerTrace {
            weights: load_weight_trace(weights, index, layer, params)?,
            inputs: load_input_trace(inputs, index, layer, params.input_bit)?,
        },
        None => synthetic_layer(layer, params, args.seed + index as u64, args.max_positions),
    })
}

fn breakdown(out: &mut String, label: &str, b: &Breakdown, scale: f64, unit: &str) -> fmt::Result {
    writeln!(
        out,
        "  {label:<22} {:>12.3} {unit}  (ADC {:.3}, accumulation {:.3}, other {:.3})",
        b.total() * scale,
        b.adc * scale,
        b.accumulation * scale,
        b.other * scale
    )
}

fn row(out: &mut String, label: &str, value: f64, unit: &str) -> fmt::Result {
    writeln!(out, "  {label:<22} {value:>12.3} {unit}")
}

/// Appends the chip report as text to `out`.
///
/// Latency is printed in ns, energy in pJ, area in um² and power in mW.
pub fn render_report(report: &ChipReport, out: &mut String) -> fmt::Result {
    for layer in &report.layers {
        let perf = &layer.performance;
        writeln!(
            out,
            "layer {} ({}, {} tiles)",
            layer.index + 1,
            mapping_name(layer.mapping),
            layer.num_tiles
        )?;
        row(out, "read latency", perf.read_latency * 1e9, "ns")?;
        row(out, "read dynamic energy", perf.read_dynamic_energy * 1e12, "pJ")?;
        row(out, "leakage energy", layer.leakage_energy * 1e12, "pJ")?;
        breakdown(out, "latency", &perf.latency, 1e9, "ns")?;
        breakdown(out, "energy", &perf.energy, 1e12, "pJ")?;
        writeln!(
            out,
            "  {:<22} {:>12.3} ns  {:.3} pJ",
            "buffer",
            perf.buffer_latency * 1e9,
            perf.buffer_dynamic_energy * 1e12
        )?;
        writeln!(
            out,
            "  {:<22} {:>12.3} ns  {:.3} pJ",
            "interconnect",
            perf.ic_latency * 1e9,
            perf.ic_dynamic_energy * 1e12
        )?;
    }

    let area = &report.area;
    let totals = &report.totals;
    writeln!(out, "chip")?;
    writeln!(
        out,
        "  {:<22} {:>12.3} um2  (ADC {:.3}, accumulation {:.3}, other {:.3}, interconnect {:.3})",
        "area",
        area.area * 1e12,
        area.adc * 1e12,
        area.accumulation * 1e12,
        area.other * 1e12,
        area.ic * 1e12
    )?;
    row(out, "read latency", totals.read_latency * 1e9, "ns")?;
    row(out, "read dynamic energy", totals.read_dynamic_energy * 1e12, "pJ")?;
    row(out, "leakage energy", report.leakage_energy * 1e12, "pJ")?;
    row(out, "leakage power", totals.leakage * 1e3, "mW")?;
    breakdown(out, "latency", &totals.latency, 1e9, "ns")?;
    breakdown(out, "energy", &totals.energy, 1e12, "pJ")?;
    row(out, "energy efficiency", report.tops_per_watt, "TOPS/W")?;
    row(out, "throughput", report.throughput, "FPS")
}
