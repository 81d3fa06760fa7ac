//! `energy_analyser_consolidate`:
//! power-meter CSV consolidation into one multi-sheet workbook.
//!
//! - `column`      : spreadsheet column labels
//! - `spec`        : configuration, sources and errors
//! - `ingest`      : CSV reading under a header offset
//! - `extract`     : date/time/power projection
//! - `timestamp`   : timestamp parsing and canonical re-emission
//! - `power`       : numeric coercion of power cells
//! - `registry`    : ordered sheet-id registry
//! - `resample`    : fixed-width bucket averages
//! - `export`      : workbook serialization
//! - `report`      : run counters and diagnostics
//! - `consolidate` : batch orchestration
pub mod column;
pub mod conf;
pub mod consolidate;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod model;
pub mod power;
pub mod registry;
pub mod report;
pub mod resample;
pub mod spec;
pub mod timestamp;

pub use column::{derive_column_label, parse_column_label};
pub use conf::{C_OUTPUT_FILE_NAME_DEFAULT, N_FILES_INPUT_MAX, N_RESAMPLE_MINUTES_DEFAULT};
pub use consolidate::{
    OutcomeConsolidate, SpecFileProcessed, build_workbook, consolidate_sources, process_source,
};
pub use export::{OutputWorkbook, SheetFrame, export_workbook};
pub use model::{
    DatasetNormalized, DatasetResampled, RecordBucket, RecordNormalized, TableExtracted, TableRaw,
};
pub use registry::{RegistryDataset, derive_sheet_id};
pub use report::{ReportConsolidate, ReportConsolidateBuilder};
pub use resample::resample_dataset;
pub use spec::{
    ConsolidateError, EnumSourceData, EnumTimestampFormat, FileError, SpecConsolidateOptions,
    SpecFieldNames, SpecSource, SpecSourceConfig, SpecSourceFile,
};
