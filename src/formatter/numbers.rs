//! Number rendering: significant-digit rounding, digit grouping and
//! Excel-style scientific notation

/// Magnitude at or above which general-format numbers switch to scientific
const SCIENTIFIC_UPPER: f64 = 1e11;
/// Non-zero magnitude below which general-format numbers switch to scientific
const SCIENTIFIC_LOWER: f64 = 1e-9;

/// Round to 15 significant digits, the precision spreadsheets display
pub fn round_significant(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    format!("{:.14e}", value).parse::<f64>().unwrap_or(value)
}

/// Whether a number would be shown in scientific notation by a general format
pub fn wants_scientific(value: f64) -> bool {
    let magnitude = value.abs();
    magnitude >= SCIENTIFIC_UPPER || (magnitude > 0.0 && magnitude < SCIENTIFIC_LOWER)
}

/// Plain decimal expansion with custom separators.
///
/// `thousand` groups the integer digits in threes when present and non-empty.
pub fn format_decimal(value: f64, decimal: &str, thousand: Option<&str>) -> String {
    // Display for f64 never produces an exponent
    let plain = format!("{}", value);
    let (integer, fraction) = match plain.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (plain.as_str(), None),
    };

    let mut out = group_digits(integer, thousand);
    if let Some(fraction) = fraction {
        out.push_str(decimal);
        out.push_str(fraction);
    }
    out
}

/// Integer rendering with optional digit grouping
pub fn format_integer(value: i64, thousand: Option<&str>) -> String {
    group_digits(&value.to_string(), thousand)
}

/// Excel general-format scientific notation, e.g. `4.60561E+12`
pub fn format_scientific(value: f64, decimal: &str) -> String {
    let formatted = format!("{:.5e}", value);
    let (mantissa, exponent) = formatted
        .split_once('e')
        .unwrap_or((formatted.as_str(), "0"));

    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };

    format!(
        "{}E{}{:02}",
        mantissa.replace('.', decimal),
        sign,
        exponent.abs()
    )
}

fn group_digits(integer: &str, thousand: Option<&str>) -> String {
    let separator = match thousand {
        Some(sep) if !sep.is_empty() => sep,
        _ => return integer.to_string(),
    };

    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(integer.len() + digits.len() / 3 * separator.len());
    grouped.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}
