//! Spreadsheet-style column labels (`A`, `Z`, `AA`, ...).

use crate::spec::ConsolidateError;

/// Convert a column label to its zero-based ordinal.
///
/// Bijective base-26: `A` -> 0, `Z` -> 25, `AA` -> 26. Surrounding
/// whitespace is ignored and letters are case-insensitive.
///
/// # Errors
/// [`ConsolidateError::InvalidColumnLabel`] on empty input, any character
/// outside `A-Z`, or overflow.
pub fn parse_column_label(label: &str) -> Result<usize, ConsolidateError> {
    let c_label = label.trim().to_ascii_uppercase();
    let err_invalid = || ConsolidateError::InvalidColumnLabel(label.to_string());
    if c_label.is_empty() {
        return Err(err_invalid());
    }

    let mut n_value: usize = 0;
    for chr in c_label.bytes() {
        if !chr.is_ascii_uppercase() {
            return Err(err_invalid());
        }
        let n_digit = usize::from(chr - b'A' + 1);
        n_value = n_value
            .checked_mul(26)
            .and_then(|n| n.checked_add(n_digit))
            .ok_or_else(err_invalid)?;
    }

    Ok(n_value - 1)
}

/// Inverse of [`parse_column_label`].
pub fn derive_column_label(ordinal: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = ordinal + 1;
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_to_ordinals() {
        assert_eq!(parse_column_label("A").unwrap(), 0);
        assert_eq!(parse_column_label("Z").unwrap(), 25);
        assert_eq!(parse_column_label("AA").unwrap(), 26);
        assert_eq!(parse_column_label("BI").unwrap(), 60);
        assert_eq!(parse_column_label("AO").unwrap(), 40);
    }

    #[test]
    fn labels_are_trimmed_and_case_insensitive() {
        assert_eq!(parse_column_label("  bi ").unwrap(), 60);
    }

    #[test]
    fn non_letter_labels_fail() {
        for label in ["1A", "", "A1", "   ", "A-B", "Ä"] {
            assert!(
                matches!(
                    parse_column_label(label),
                    Err(ConsolidateError::InvalidColumnLabel(_))
                ),
                "{label:?}"
            );
        }
    }

    #[test]
    fn overflowing_label_fails() {
        let label = "Z".repeat(40);
        assert!(parse_column_label(&label).is_err());
    }

    #[test]
    fn derive_label_inverts_parse() {
        for ordinal in [0, 25, 26, 40, 60, 701, 702, 16_383] {
            let label = derive_column_label(ordinal);
            assert_eq!(parse_column_label(&label).unwrap(), ordinal, "{label}");
        }
        assert_eq!(derive_column_label(701), "ZZ");
    }
}
