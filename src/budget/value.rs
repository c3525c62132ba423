use std::sync::LazyLock;

use regex::Regex;

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.\-]").expect("static pattern"));

/// Parse a numeric cell that may carry stray characters (currency symbols,
/// thousands separators, trailing units). Returns `None` when nothing
/// numeric is left.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Like [`parse_number`] but defaults to zero, for line totals.
pub fn parse_amount(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Trimmed cell content, or `None` for blank cells.
pub fn non_empty(raw: &str) -> Option<&str> {
    let s = raw.trim();
    (!s.is_empty()).then_some(s)
}

/// Normalize a header label for comparison: lower-case, fold Spanish
/// accents, drop whitespace and periods.
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_strips_noise() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number("S/ 500.00"), Some(500.0));
        assert_eq!(parse_number("  -42.5 "), Some(-42.5));
        assert_eq!(parse_number("100 m2"), Some(1002.0));
        assert_eq!(parse_number("12"), Some(12.0));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn test_parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("2,000.00"), 2000.0);
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("DESCRIPCION "), "descripcion");
        assert_eq!(normalize_label("Descripción"), "descripcion");
        assert_eq!(normalize_label("Und."), "und");
        assert_eq!(normalize_label("P. U."), "pu");
        assert_eq!(normalize_label("Precio Unitario"), "preciounitario");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  x "), Some("x"));
        assert_eq!(non_empty("   "), None);
    }
}
