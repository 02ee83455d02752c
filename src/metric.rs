//! Engineering (metric-prefix) notation codec
//!
//! Converts between scalar doubles and strings like `"3.30k"` or `"470n"`.
//! `to_metric` and `from_metric` are exact inverses up to the formatting
//! precision, which the round-trip tests rely on.

use crate::types::{Result, WaveError};

/// Multiplier for a single-letter metric prefix.
///
/// The table is fixed: 'K' is an alias for kilo but milli is never matched
/// case-insensitively, so 'M' is always mega.
fn multiplier(prefix: char) -> Option<f64> {
    match prefix {
        'y' => Some(1e-24),
        'z' => Some(1e-21),
        'a' => Some(1e-18),
        'f' => Some(1e-15),
        'p' => Some(1e-12),
        'n' => Some(1e-9),
        'u' | 'µ' => Some(1e-6),
        'm' => Some(1e-3),
        'k' | 'K' => Some(1e3),
        'M' => Some(1e6),
        'G' => Some(1e9),
        'T' => Some(1e12),
        'P' => Some(1e15),
        'E' => Some(1e18),
        'Z' => Some(1e21),
        'Y' => Some(1e24),
        _ => None,
    }
}

/// Prefix symbol for a power-of-ten exponent that is a multiple of 3.
fn prefix_symbol(exponent: i32) -> Option<&'static str> {
    match exponent {
        -24 => Some("y"),
        -21 => Some("z"),
        -18 => Some("a"),
        -15 => Some("f"),
        -12 => Some("p"),
        -9 => Some("n"),
        -6 => Some("µ"),
        -3 => Some("m"),
        0 => Some(""),
        3 => Some("k"),
        6 => Some("M"),
        9 => Some("G"),
        12 => Some("T"),
        15 => Some("P"),
        18 => Some("E"),
        21 => Some("Z"),
        24 => Some("Y"),
        _ => None,
    }
}

/// Parse an engineering-notation string into a double.
///
/// Grammar: optional sign, digits, optional decimal point, optional single
/// metric prefix letter. The whole input must match; anything else fails
/// with [`WaveError::InvalidNotation`].
pub fn from_metric(text: &str) -> Result<f64> {
    let s = text.trim();
    let mut chars = s.chars().peekable();
    let mut number = String::new();

    if chars.peek() == Some(&'-') {
        number.push('-');
        chars.next();
    }

    let mut digit_count = 0usize;
    let mut seen_dot = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digit_count += 1;
            number.push(c);
            chars.next();
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            number.push(c);
            chars.next();
        } else {
            break;
        }
    }

    if digit_count == 0 {
        return Err(WaveError::InvalidNotation(text.to_string()));
    }

    let scale = match chars.next() {
        None => 1.0,
        Some(c) => match multiplier(c) {
            // The prefix must be the final character.
            Some(m) if chars.next().is_none() => m,
            _ => return Err(WaveError::InvalidNotation(text.to_string())),
        },
    };

    let value: f64 = number
        .parse()
        .map_err(|_| WaveError::InvalidNotation(text.to_string()))?;

    Ok(value * scale)
}

/// Format a double in engineering notation with `precision` fractional digits.
///
/// Zero renders as the literal `"0"`. Otherwise the value is scaled by the
/// nearest power-of-1000 exponent, clamped to the [-24, 24] prefix table.
/// An exponent outside the table falls back to an `e<exp>` suffix, which the
/// clamp makes unreachable in practice but keeps the mapping total.
pub fn to_metric(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let exponent = ((value.abs().log10() / 3.0).floor() as i32 * 3).clamp(-24, 24);
    let scaled = value / 10f64.powi(exponent);

    match prefix_symbol(exponent) {
        Some(prefix) => format!("{scaled:.precision$}{prefix}"),
        None => format!("{scaled:.precision$}e{exponent}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(from_metric("33").unwrap(), 33.0);
        assert_eq!(from_metric("-2.5").unwrap(), -2.5);
        assert_eq!(from_metric(" 470 ").unwrap(), 470.0);
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(from_metric("68n").unwrap(), 68e-9);
        assert_eq!(from_metric("47u").unwrap(), 47e-6);
        assert_eq!(from_metric("47µ").unwrap(), 47e-6);
        assert_eq!(from_metric("1k").unwrap(), 1e3);
        assert_eq!(from_metric("1K").unwrap(), 1e3);
        assert_eq!(from_metric("2.2M").unwrap(), 2.2e6);
        assert_eq!(from_metric("2.2m").unwrap(), 2.2e-3);
        // The prefix multiply rounds once more than the literal, so the
        // smallest tiers are compared with a relative tolerance.
        let value = from_metric("-3.3p").unwrap();
        assert!(((value - -3.3e-12) / -3.3e-12).abs() < 1e-15, "got {value}");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(from_metric("").is_err());
        assert!(from_metric("k").is_err());
        assert!(from_metric("-.").is_err());
        assert!(from_metric("1.2.3").is_err());
        assert!(from_metric("10kk").is_err());
        assert!(from_metric("12Q").is_err());
        assert!(from_metric("k12").is_err());
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(to_metric(0.0, 2), "0");
    }

    #[test]
    fn test_format_basic() {
        assert_eq!(to_metric(3300.0, 2), "3.30k");
        assert_eq!(to_metric(0.047, 2), "47.00m");
        assert_eq!(to_metric(68e-9, 2), "68.00n");
        assert_eq!(to_metric(-1.5e6, 2), "-1.50M");
        assert_eq!(to_metric(47e-6, 2), "47.00µ");
        assert_eq!(to_metric(12.0, 3), "12.000");
    }

    #[test]
    fn test_format_clamps_extremes() {
        // Beyond the table the exponent clamps to the outermost prefix.
        assert!(to_metric(1e27, 2).ends_with('Y'));
        assert!(to_metric(1e-27, 2).ends_with('y'));
    }

    #[test]
    fn test_round_trip_all_tiers() {
        for exp in (-24..=24).step_by(3) {
            let value = 4.71 * 10f64.powi(exp);
            let text = to_metric(value, 3);
            let back = from_metric(&text).unwrap();
            let rel = ((back - value) / value).abs();
            assert!(rel < 1e-3, "tier {exp}: {value} -> {text} -> {back}");
        }
    }
}
