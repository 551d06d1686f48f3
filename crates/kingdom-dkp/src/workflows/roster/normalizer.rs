/// Lowercases a header and collapses its whitespace, stripping the BOM and
/// zero-width characters spreadsheet exports like to prepend.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}

/// Reads a numeric cell. Thousands separators are ignored; blank or
/// non-numeric cells yield `None`.
pub(crate) fn parse_number(cell: &str) -> Option<f64> {
    let digits: String = cell
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '_' | ' ' | '\u{a0}'))
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Player IDs arrive as text or as numbers rendered with a trailing `.0`.
pub(crate) fn normalize_id(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let id = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_collapse_case_and_spacing() {
        assert_eq!(normalize_header("\u{feff}  Current   Power "), "current power");
        assert_eq!(normalize_header("T4 Kills"), "t4 kills");
    }

    #[test]
    fn numbers_accept_thousands_separators() {
        assert_eq!(parse_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_number(" 42.5 "), Some(42.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn ids_drop_float_suffix() {
        assert_eq!(normalize_id("12345.0").as_deref(), Some("12345"));
        assert_eq!(normalize_id(" abc ").as_deref(), Some("abc"));
        assert_eq!(normalize_id("   "), None);
    }
}
