mod args;
mod config;
mod input;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use energy_analyser_consolidate::{
    N_FILES_INPUT_MAX, OutcomeConsolidate, SpecConsolidateOptions, SpecSource, SpecSourceFile,
    build_workbook, consolidate_sources,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::config::resolve_run_plan;
use crate::input::{expand_inputs, truncate_inputs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let plan = resolve_run_plan(cli)?;
    init_tracing(plan.log_level.as_deref())?;

    let spec = SpecSource::from_config(&plan.source).context("Invalid configuration")?;

    let l_paths = expand_inputs(&cli.inputs, &plan.pattern)?;
    if l_paths.is_empty() {
        bail!("No input files matched {:?}.", plan.pattern);
    }
    let (l_paths, n_dropped) = truncate_inputs(l_paths, N_FILES_INPUT_MAX);
    if n_dropped > 0 {
        warn!(
            "Only the first {N_FILES_INPUT_MAX} files are processed; {n_dropped} ignored."
        );
    }

    let l_sources: Vec<SpecSourceFile> = l_paths.iter().map(SpecSourceFile::from_path).collect();
    let options = SpecConsolidateOptions {
        num_workers_max: plan.workers,
    };
    let outcome = consolidate_sources(&l_sources, &spec, &options);

    print_preview(&outcome, cli.preview_rows);
    for err in &outcome.report.errors {
        println!("skipped: {err}");
    }
    println!("{}", outcome.report);

    let output = build_workbook(&outcome, &spec)?;
    fs::write(&plan.output, &output.bytes)
        .with_context(|| format!("Failed to write {}", plan.output.display()))?;
    info!(path = %plan.output.display(), "workbook saved");
    println!(
        "Wrote {} sheet(s) to {}",
        output.sheet_names.len(),
        plan.output.display()
    );
    Ok(())
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level {level:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn print_preview(outcome: &OutcomeConsolidate, n_rows: usize) {
    let Some((sheet_id, dataset)) = outcome.registry.iter().next() else {
        return;
    };
    println!("Preview of {sheet_id} ({} rows):", dataset.records.len());
    println!(
        "{:<12} {:<10} {}",
        dataset.fields.date, dataset.fields.time, dataset.fields.power
    );
    for record in dataset.records.iter().take(n_rows) {
        let c_power = record.power.map(|n| n.to_string()).unwrap_or_default();
        println!("{:<12} {:<10} {c_power}", record.date, record.time);
    }
}
