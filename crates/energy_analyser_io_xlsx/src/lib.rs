//! `energy_analyser_io_xlsx`:
//! XLSX writer kernel used by the consolidation pipeline.
//!
//! - `conf`   : constants and default presets
//! - `spec`   : formats, options and reports
//! - `util`   : pure helper functions
//! - `writer` : in-memory workbook writer
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_NUM_FORMAT_TEXT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumColumnKind, SpecAutofitCellsPolicy,
    SpecCellFormat, SpecColumnFormatPlan, SpecSheetSlice, SpecXlsxReport, SpecXlsxValuePolicy,
    SpecXlsxWriteOptions,
};
pub use util::{plan_sheet_slices, sanitize_sheet_name};
pub use writer::{SpecXlsxSheetWriteOptions, XlsxWriter};
