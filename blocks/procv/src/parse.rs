use serde_json::Value;

/// Pull one cell out of a header-driven row as text. Numbers keep their
/// JSON rendering; anything unreadable becomes the empty string.
pub fn cell_text(row: &serde_json::Map<String, Value>, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Parse a currency/decimal cell. Accepts Brazilian decimal-comma
/// formatting ("1.234,56"), plain dot decimals and a leading "R$".
/// Malformed values become 0 - a bad cell must not abort the row.
pub fn parse_decimal(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    // "1.234,56" - dots are thousands separators, comma is the decimal
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse().unwrap_or(0.0)
}

/// Parse a stock-quantity cell; fractions are truncated, malformed
/// values become 0.
pub fn parse_quantity(raw: &str) -> i64 {
    parse_decimal(raw) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn brazilian_decimal_comma_is_understood() {
        assert_eq!(parse_decimal("1.234,56"), 1234.56);
        assert_eq!(parse_decimal("10,5"), 10.5);
        assert_eq!(parse_decimal("R$ 99,90"), 99.9);
    }

    #[test]
    fn plain_dot_decimals_still_work() {
        assert_eq!(parse_decimal("1234.56"), 1234.56);
        assert_eq!(parse_decimal("100"), 100.0);
        assert_eq!(parse_decimal(" 42 "), 42.0);
    }

    #[test]
    fn malformed_values_default_to_zero() {
        assert_eq!(parse_decimal("abc"), 0.0);
        assert_eq!(parse_decimal(""), 0.0);
        assert_eq!(parse_decimal("--"), 0.0);
        assert_eq!(parse_quantity("n/a"), 0);
    }

    #[test]
    fn quantities_truncate_fractions() {
        assert_eq!(parse_quantity("12,9"), 12);
        assert_eq!(parse_quantity("30"), 30);
    }

    #[test]
    fn cells_read_strings_and_numbers() {
        let row = json!({"REFERENCIA": "A1", "VALOR": 100, "ESTOQUE": "15"})
            .as_object()
            .unwrap()
            .clone();
        assert_eq!(cell_text(&row, "REFERENCIA"), "A1");
        assert_eq!(cell_text(&row, "VALOR"), "100");
        assert_eq!(cell_text(&row, "ESTOQUE"), "15");
        assert_eq!(cell_text(&row, "MISSING"), "");
    }
}
