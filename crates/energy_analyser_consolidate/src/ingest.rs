//! CSV ingestion with a header offset and Latin-1 decoding.

use std::fs::File;
use std::io::{BufReader, Read};

use csv::{ByteRecord, ReaderBuilder};
use tracing::debug;

use crate::model::TableRaw;
use crate::spec::{EnumSourceData, FileError, SpecSource, SpecSourceFile};

const V_BOM_UTF8: &[u8] = b"\xEF\xBB\xBF";

/// Open one source and read it with [`read_raw_table`].
pub fn ingest_source(source: &SpecSourceFile, spec: &SpecSource) -> Result<TableRaw, FileError> {
    match &source.data {
        EnumSourceData::Bytes(v_bytes) => {
            read_raw_table(v_bytes.as_slice(), spec.header_row, spec.delimiter, &source.name)
        }
        EnumSourceData::Path(path) => {
            let file = File::open(path).map_err(|err| FileError::Ingest {
                file: source.name.clone(),
                message: format!("cannot open {}: {err}", path.display()),
            })?;
            read_raw_table(
                BufReader::new(file),
                spec.header_row,
                spec.delimiter,
                &source.name,
            )
        }
    }
}

/// Read a delimited stream into a [`TableRaw`].
///
/// Rows before `header_row` (0-based, blank lines not counted) are
/// discarded, the header row gives the labels and every later row is data.
/// Bytes are decoded as Latin-1, so no input is undecodable.
pub fn read_raw_table<R: Read>(
    reader: R,
    header_row: usize,
    delimiter: u8,
    name_file: &str,
) -> Result<TableRaw, FileError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote(b'"')
        .from_reader(reader);

    let mut labels: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut n_idx_row = 0usize;

    for record in csv_reader.byte_records() {
        let record = record.map_err(|err| FileError::Ingest {
            file: name_file.to_string(),
            message: err.to_string(),
        })?;
        if is_blank_record(&record) {
            continue;
        }

        if n_idx_row == header_row {
            labels = Some(decode_record(&record, n_idx_row == 0));
        } else if n_idx_row > header_row {
            rows.push(decode_record(&record, false));
        }
        n_idx_row += 1;
    }

    let Some(labels) = labels else {
        return Err(FileError::Ingest {
            file: name_file.to_string(),
            message: format!(
                "stream ended before header row {} ({n_idx_row} non-blank rows)",
                header_row + 1
            ),
        });
    };

    debug!(
        file = name_file,
        rows = rows.len(),
        cols = labels.len(),
        "ingested CSV"
    );
    Ok(TableRaw { labels, rows })
}

fn is_blank_record(record: &ByteRecord) -> bool {
    record.iter().all(|field| field.iter().all(u8::is_ascii_whitespace))
}

fn decode_record(record: &ByteRecord, if_first_row: bool) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(n_idx, field)| {
            let field = if if_first_row && n_idx == 0 {
                field.strip_prefix(V_BOM_UTF8).unwrap_or(field)
            } else {
                field
            };
            decode_latin1(field)
        })
        .collect()
}

fn decode_latin1(v_bytes: &[u8]) -> String {
    v_bytes.iter().map(|&b| char::from(b)).collect()
}
