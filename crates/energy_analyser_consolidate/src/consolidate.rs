//! Per-file pipeline and batch orchestration.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::export::{OutputWorkbook, export_workbook};
use crate::extract::extract_fields;
use crate::ingest::ingest_source;
use crate::model::DatasetNormalized;
use crate::power::sanitize_power;
use crate::registry::{RegistryDataset, derive_sheet_id};
use crate::report::{ReportConsolidate, ReportConsolidateBuilder};
use crate::resample::resample_dataset;
use crate::spec::{
    ConsolidateError, FileError, SpecConsolidateOptions, SpecSource, SpecSourceFile,
};
use crate::timestamp::normalize_timestamps;

/// Dataset of one accepted file plus its row counters.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFileProcessed {
    pub dataset: DatasetNormalized,
    pub cnt_rows_raw: usize,
    pub cnt_rows_dropped: usize,
    pub cnt_power_missing: usize,
}

/// Result of [`consolidate_sources`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeConsolidate {
    /// Accepted datasets in input order.
    pub registry: RegistryDataset<DatasetNormalized>,
    pub report: ReportConsolidate,
}

/// Run ingest, extract, timestamp and power stages for one file.
///
/// Pure apart from reading the source; touches no shared state.
pub fn process_source(
    source: &SpecSourceFile,
    spec: &SpecSource,
) -> Result<SpecFileProcessed, FileError> {
    let table_raw = ingest_source(source, spec)?;
    let cnt_rows_raw = table_raw.height();
    let table_extracted = extract_fields(&table_raw, spec, &source.name)?;
    let outcome_ts = normalize_timestamps(table_extracted, spec.timestamp_format, &source.name)?;
    let (records, cnt_power_missing) = sanitize_power(outcome_ts.records);

    debug!(
        file = %source.name,
        rows = cnt_rows_raw,
        dropped = outcome_ts.cnt_dropped,
        "source normalized"
    );
    Ok(SpecFileProcessed {
        dataset: DatasetNormalized {
            sheet_id: derive_sheet_id(&source.name),
            name_source: source.name.clone(),
            fields: spec.fields.clone(),
            records,
        },
        cnt_rows_raw,
        cnt_rows_dropped: outcome_ts.cnt_dropped,
        cnt_power_missing,
    })
}

/// Process every source and register the accepted ones in input order.
///
/// Per-file failures are recorded in the report and never stop the batch.
/// Parsing may run on a worker pool; registration happens on the calling
/// thread so later files overwrite earlier ones deterministically.
pub fn consolidate_sources(
    sources: &[SpecSourceFile],
    spec: &SpecSource,
    options: &SpecConsolidateOptions,
) -> OutcomeConsolidate {
    let mut builder_report = ReportConsolidateBuilder::new(sources.len() as u64);
    let n_workers = calculate_worker_limit(options.num_workers_max);
    info!(files = sources.len(), workers = n_workers, "consolidation started");

    let l_results = process_sources(sources, spec, n_workers, &mut builder_report);

    let mut registry = RegistryDataset::new();
    for result in l_results {
        match result {
            Ok(processed) => {
                if processed.cnt_rows_dropped > 0 {
                    builder_report.add_warning(format!(
                        "{}: dropped {} rows with unparseable timestamps.",
                        processed.dataset.name_source, processed.cnt_rows_dropped
                    ));
                }
                builder_report.add_accepted(
                    processed.cnt_rows_raw as u64,
                    processed.cnt_rows_dropped as u64,
                    processed.cnt_power_missing as u64,
                );

                let name_source = processed.dataset.name_source.clone();
                let sheet_id = processed.dataset.sheet_id.clone();
                if let Some(replaced) = registry.insert(sheet_id.clone(), processed.dataset) {
                    let msg = format!(
                        "Sheet {sheet_id:?} from {} was overwritten by {name_source}.",
                        replaced.name_source
                    );
                    warn!("{msg}");
                    builder_report.add_overwritten();
                    builder_report.add_warning(msg);
                }
            }
            Err(err) => {
                warn!("{err}");
                builder_report.add_error(err);
            }
        }
    }

    let report = builder_report.build();
    info!("{report}");
    OutcomeConsolidate { registry, report }
}

/// Export the outcome, resampled when `spec.resample_minutes` is set.
pub fn build_workbook(
    outcome: &OutcomeConsolidate,
    spec: &SpecSource,
) -> Result<OutputWorkbook, ConsolidateError> {
    let output = match spec.resample_minutes {
        None => export_workbook(&outcome.registry)?,
        Some(minutes_bucket) => {
            let registry_resampled = outcome
                .registry
                .map_values(|dataset| resample_dataset(dataset, minutes_bucket));
            export_workbook(&registry_resampled)?
        }
    };
    for msg in &output.warnings {
        warn!("{msg}");
    }
    info!(
        sheets = output.sheet_names.len(),
        bytes = output.bytes.len(),
        "workbook built"
    );
    Ok(output)
}

fn process_sources(
    sources: &[SpecSourceFile],
    spec: &SpecSource,
    n_workers: usize,
    builder_report: &mut ReportConsolidateBuilder,
) -> Vec<Result<SpecFileProcessed, FileError>> {
    let process_serial = || {
        sources
            .iter()
            .map(|source| process_source(source, spec))
            .collect::<Vec<_>>()
    };
    if n_workers <= 1 || sources.len() <= 1 {
        return process_serial();
    }

    let Ok(thread_pool) = ThreadPoolBuilder::new().num_threads(n_workers).build() else {
        builder_report.add_warning(format!(
            "Failed to initialize thread pool (workers={n_workers}); fallback to serial parsing."
        ));
        return process_serial();
    };
    thread_pool.install(|| {
        sources
            .par_iter()
            .map(|source| process_source(source, spec))
            .collect()
    })
}

/// `Some(n)` is clamped to `1..=n_cpu`; `None` means serial.
fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => 1,
    }
}
