//! Per-column normalization rules.
//!
//! Each function handles exactly one derived or rewritten column so it can be tested on its own.
//! The `row` arguments are 1-based data row numbers used in error messages.

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::Value;

/// Marker placed before every formatted price.
pub const CURRENCY_MARKER: &str = "R$ ";

/// Number of description characters kept as the model code.
pub const MODEL_CODE_LEN: usize = 9;

/// Display text of a cell as written to a label sheet.
///
/// Missing values, NaN and any text equal to `nan` (ignoring case) become the empty string.
/// Integral floats are shown without a fractional part, so `12.0` reads `12`.
pub fn display_value(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => float_text(*f),
        Value::Bool(b) => b.to_string(),
        Value::Utf8(s) => s.clone(),
    };
    if is_null_marker(&text) {
        String::new()
    } else {
        text
    }
}

/// `true` if `text` would be read back as a null marker.
pub fn is_null_marker(text: &str) -> bool {
    text.eq_ignore_ascii_case("nan")
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        String::new()
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

/// Description text, or `None` when the cell is missing or empty.
pub fn description_text(value: &Value) -> Option<String> {
    let text = display_value(value);
    if text.is_empty() { None } else { Some(text) }
}

/// Split a description into `(PRODUTO, DESCRICAO)` at the first space.
///
/// Everything after the first space is kept verbatim, so `PRODUTO + " " + DESCRICAO` gives back
/// the description whenever it contains a space.
pub fn split_description(description: Option<&str>) -> (String, String) {
    match description {
        None => (String::new(), String::new()),
        Some(d) => match d.split_once(' ') {
            Some((head, tail)) => (head.to_string(), tail.to_string()),
            None => (d.to_string(), String::new()),
        },
    }
}

/// First [`MODEL_CODE_LEN`] characters of the description (`PROD_DESC`).
pub fn model_code(description: Option<&str>) -> String {
    description
        .map(|d| d.chars().take(MODEL_CODE_LEN).collect())
        .unwrap_or_default()
}

/// Image path for a model code (`IMAGEM_MODELO_NEW`); empty when there is no description.
pub fn image_path(model_code: Option<&str>, prefix: &str, suffix: &str) -> String {
    match model_code {
        Some(code) => format!("{prefix}{code}{suffix}"),
        None => String::new(),
    }
}

/// Brazilian-Portuguese currency text: `1234.5` → `R$ 1.234,50`.
pub fn format_brl(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    // Amounts that round to zero print without a sign.
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!(
        "{CURRENCY_MARKER}{sign}{},{frac_part}",
        group_thousands(int_part, '.')
    )
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Rewrite a `PRECO_UNIT_PDV` cell as currency text; missing prices become "".
///
/// Text must parse as a number; blank text is rejected like any other non-number.
pub fn price_text(row: usize, column: &str, value: &Value) -> ProcessingResult<String> {
    if value.is_missing() {
        return Ok(String::new());
    }
    let amount = match value {
        Value::Float64(f) => *f,
        Value::Int64(i) => *i as f64,
        Value::Utf8(s) if is_null_marker(s.trim()) => return Ok(String::new()),
        Value::Utf8(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| parse_error(row, column, value, e.to_string()))?,
        _ => return Err(parse_error(row, column, value, "expected number".to_string())),
    };
    if !amount.is_finite() {
        return Err(parse_error(row, column, value, "price must be finite".to_string()));
    }
    Ok(format_brl(amount))
}

/// `LARGURA` display text; "" when absent.
pub fn width_text(value: &Value) -> String {
    display_value(value)
}

/// Number of copies requested by a `QTD` cell.
///
/// Missing, negative and fractional quantities are rejected.
pub fn quantity(row: usize, column: &str, value: &Value) -> ProcessingResult<usize> {
    let n = match value {
        Value::Int64(i) => *i,
        Value::Float64(f) if f.is_finite() && f.fract() == 0.0 => *f as i64,
        Value::Utf8(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| parse_error(row, column, value, e.to_string()))?,
        Value::Null => {
            return Err(parse_error(row, column, value, "missing quantity".to_string()));
        }
        Value::Float64(f) if f.is_nan() => {
            return Err(parse_error(row, column, value, "missing quantity".to_string()));
        }
        _ => return Err(parse_error(row, column, value, "expected integer".to_string())),
    };
    usize::try_from(n)
        .map_err(|_| parse_error(row, column, value, "quantity must be non-negative".to_string()))
}

fn parse_error(row: usize, column: &str, value: &Value, message: String) -> ProcessingError {
    ProcessingError::ParseError {
        row,
        column: column.to_string(),
        raw: raw_text(value),
        message,
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Utf8(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_brazilian_separators() {
        assert_eq!(format_brl(1234.5), "R$ 1.234,50");
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(99.9), "R$ 99,90");
        assert_eq!(format_brl(1_234_567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(100.0), "R$ 100,00");
        assert_eq!(format_brl(-1234.5), "R$ -1.234,50");
        assert_eq!(format_brl(-0.001), "R$ 0,00");
    }

    #[test]
    fn price_text_handles_missing_numbers_and_text() {
        assert_eq!(price_text(1, "P", &Value::Null).unwrap(), "");
        assert_eq!(price_text(1, "P", &Value::Float64(f64::NAN)).unwrap(), "");
        assert_eq!(price_text(1, "P", &Value::Int64(10)).unwrap(), "R$ 10,00");
        assert_eq!(price_text(1, "P", &Value::text(" 1234.5 ")).unwrap(), "R$ 1.234,50");

        let err = price_text(4, "P", &Value::text("dez reais")).unwrap_err();
        assert!(matches!(err, ProcessingError::ParseError { row: 4, .. }));
        assert!(price_text(1, "P", &Value::Float64(f64::INFINITY)).is_err());
        assert!(price_text(1, "P", &Value::Bool(true)).is_err());
    }

    #[test]
    fn blank_price_text_is_rejected() {
        let err = price_text(3, "PRECO_UNIT_PDV", &Value::text("   ")).unwrap_err();
        assert!(matches!(err, ProcessingError::ParseError { row: 3, ref raw, .. } if raw == "   "));
        assert!(price_text(3, "PRECO_UNIT_PDV", &Value::text("")).is_err());
        assert_eq!(price_text(3, "PRECO_UNIT_PDV", &Value::text(" NaN ")).unwrap(), "");
    }

    #[test]
    fn split_rebuilds_description() {
        let desc = "SAP123456 SCARPIN  COURO PRETO";
        let (produto, descricao) = split_description(Some(desc));
        assert_eq!(produto, "SAP123456");
        assert_eq!(descricao, "SCARPIN  COURO PRETO");
        assert_eq!(format!("{produto} {descricao}"), desc);
    }

    #[test]
    fn split_without_space_or_description() {
        assert_eq!(split_description(Some("BOTA")), ("BOTA".to_string(), String::new()));
        assert_eq!(split_description(None), (String::new(), String::new()));
        assert_eq!(
            split_description(Some("BOTA ")),
            ("BOTA".to_string(), String::new())
        );
    }

    #[test]
    fn model_code_is_a_char_prefix() {
        assert_eq!(model_code(Some("JB1234567 SANDALIA")), "JB1234567");
        assert_eq!(model_code(Some("CURTO")), "CURTO");
        assert_eq!(model_code(Some("ÇÃÓ ABCDEFGH")), "ÇÃÓ ABCDE");
        assert_eq!(model_code(Some("AB CD EF GH")), "AB CD EF ");
        assert_eq!(model_code(None), "");

        let code = model_code(Some("ÇÃÓ ABCDEFGH"));
        assert_eq!(code.chars().count(), MODEL_CODE_LEN);
        assert!("ÇÃÓ ABCDEFGH".starts_with(&code));
    }

    #[test]
    fn image_path_embeds_model_code() {
        assert_eq!(image_path(Some("JB1234567"), r"\\srv\img\", ".jpg"), r"\\srv\img\JB1234567.jpg");
        assert_eq!(image_path(None, r"\\srv\img\", ".jpg"), "");
    }

    #[test]
    fn display_never_emits_nan() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&Value::Float64(f64::NAN)), "");
        assert_eq!(display_value(&Value::text("nan")), "");
        assert_eq!(display_value(&Value::text("NaN")), "");
        assert_eq!(display_value(&Value::text("NAN")), "");
        assert_eq!(display_value(&Value::text("nano")), "nano");
    }

    #[test]
    fn display_of_numbers() {
        assert_eq!(display_value(&Value::Float64(12.0)), "12");
        assert_eq!(display_value(&Value::Float64(7891234567890.0)), "7891234567890");
        assert_eq!(display_value(&Value::Float64(1.5)), "1.5");
        assert_eq!(display_value(&Value::Int64(-3)), "-3");
        assert_eq!(display_value(&Value::Bool(false)), "false");
    }

    #[test]
    fn width_is_empty_when_absent() {
        assert_eq!(width_text(&Value::Null), "");
        assert_eq!(width_text(&Value::text("W")), "W");
        assert_eq!(width_text(&Value::Float64(2.5)), "2.5");
    }

    #[test]
    fn quantity_rules() {
        assert_eq!(quantity(1, "QTD", &Value::Int64(3)).unwrap(), 3);
        assert_eq!(quantity(1, "QTD", &Value::Int64(0)).unwrap(), 0);
        assert_eq!(quantity(1, "QTD", &Value::Float64(2.0)).unwrap(), 2);
        assert_eq!(quantity(1, "QTD", &Value::text(" 4 ")).unwrap(), 4);

        assert!(quantity(1, "QTD", &Value::Int64(-1)).is_err());
        assert!(quantity(1, "QTD", &Value::Float64(1.5)).is_err());
        assert!(quantity(1, "QTD", &Value::Float64(f64::NAN)).is_err());
        let err = quantity(7, "QTD", &Value::Null).unwrap_err();
        assert!(err.to_string().contains("missing quantity"));
    }
}
