//! Excel limits and default format presets.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters Excel rejects in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Sheet name Excel reserves, compared case-insensitively.
pub const C_EXCEL_SHEET_NAME_RESERVED: &str = "History";
/// Number format that keeps a cell as text.
pub const C_NUM_FORMAT_TEXT: &str = "@";

/// Keys of [`derive_default_xlsx_formats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    Text,
    Decimal,
    Header,
}

impl EnumFmtKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Decimal => "decimal",
            Self::Header => "header",
        }
    }
}

/// Named presets used by [`crate::writer::XlsxWriter::with_default_formats`].
///
/// `text` carries the `@` number format so strings such as `05/03/2024` stay
/// text when the workbook is edited.
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let fmt_base = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Text.as_str().to_string(),
        fmt_base.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_TEXT.to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Decimal.as_str().to_string(),
        fmt_base.with_(SpecCellFormat {
            num_format: Some("0.000".to_string()),
            align: Some("right".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        fmt_base.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_formats_cover_every_key() {
        let dict_fmt = derive_default_xlsx_formats();
        for key in [EnumFmtKey::Text, EnumFmtKey::Decimal, EnumFmtKey::Header] {
            assert!(dict_fmt.contains_key(key.as_str()), "missing {key:?}");
        }
        assert_eq!(
            dict_fmt["text"].num_format.as_deref(),
            Some(C_NUM_FORMAT_TEXT)
        );
        assert_eq!(dict_fmt["header"].bold, Some(true));
        assert_eq!(dict_fmt["decimal"].font_name.as_deref(), Some("Calibri"));
    }
}
