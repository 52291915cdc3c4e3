//! Arbitrary-precision numeric helpers.
//!
//! Every Rose number is a [`rug::Float`] carrying [`PRECISION`] bits of
//! mantissa.  Operations round to nearest at each step.

use rug::float::{Constant, Special};
use rug::ops::Pow;
use rug::{Float, Integer};

/// Working precision, in mantissa bits, of every number.
pub const PRECISION: u32 = 256;

/// Number of fractional digits used when formatting numbers.
pub const DISPLAY_DECIMALS: usize = 16;

/// Creates a number from anything `rug` can assign into a [`Float`].
pub fn from<T>(value: T) -> Float
where
    Float: rug::Assign<T>,
{
    Float::with_val(PRECISION, value)
}

/// `NaN` at working precision.
pub fn nan() -> Float {
    from(Special::Nan)
}

/// Positive infinity at working precision.
pub fn infinity() -> Float {
    from(Special::Infinity)
}

/// π at working precision.
pub fn pi() -> Float {
    from(Constant::Pi)
}

/// Euler's number at working precision.
pub fn e() -> Float {
    from(1).exp()
}

/// The golden ratio `(1 + √5) / 2` at working precision.
pub fn phi() -> Float {
    let root5 = from(5).sqrt();
    (root5 + 1u32) / 2u32
}

/// Parses the text of a numeric literal (`_` separators allowed).
///
/// Returns `None` when the cleaned text is not a decimal number.
pub fn parse_literal(raw: &str) -> Option<Float> {
    let clean: String = raw.chars().filter(|&c| c != '_').collect();
    if clean.is_empty() || !clean.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    Float::parse(&clean).ok().map(from)
}

/// `a % b` with the sign of the dividend (C `fmod` semantics).
pub fn fmod(a: &Float, b: &Float) -> Float {
    if b.is_infinite() && a.is_finite() {
        return a.clone();
    }
    let quotient = from(a / b).trunc();
    from(a - &from(&quotient * b))
}

/// `a ** b`.
pub fn pow(a: &Float, b: &Float) -> Float {
    from(a.clone().pow(b))
}

/// Converts to a 32-bit two's-complement integer (`NaN` and infinities map
/// to zero).
pub fn to_int32(value: &Float) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    value
        .clone()
        .trunc()
        .to_integer()
        .map_or(0, |i| i.to_i32_wrapping())
}

/// Converts to a non-negative array index, if the number is one.
pub fn to_index(value: &Float) -> Option<usize> {
    if !value.is_integer() || (value.is_sign_negative() && !value.is_zero()) {
        return None;
    }
    value.to_integer().and_then(|i| i.to_usize())
}

/// Formats a number the way the interpreter prints it.
///
/// Finite values are written in fixed notation with up to
/// [`DISPLAY_DECIMALS`] fractional digits; trailing zeros are dropped and
/// negative zero prints as `0`.
pub fn format(value: &Float) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-Infinity".to_owned()
        } else {
            "Infinity".to_owned()
        };
    }

    let scale = Integer::from(10u32).pow(DISPLAY_DECIMALS as u32);
    let scaled = from(value * &from(&scale)).round();
    let Some(mut digits) = scaled.to_integer() else {
        return "NaN".to_owned();
    };
    let negative = digits < 0;
    digits.abs_mut();

    let mut text = digits.to_string();
    if text.len() <= DISPLAY_DECIMALS {
        text = format!("{}{text}", "0".repeat(DISPLAY_DECIMALS + 1 - text.len()));
    }
    let split = text.len() - DISPLAY_DECIMALS;
    let (int_part, frac_part) = text.split_at(split);
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(int_part);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_with_separators() {
        let n = parse_literal("1_000.5").unwrap();
        assert_eq!(format(&n), "1000.5");
        assert!(parse_literal("1e5").is_none());
        assert!(parse_literal("").is_none());
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format(&from(3)), "3");
        assert_eq!(format(&from(2.5)), "2.5");
        assert_eq!(format(&from(-0.25)), "-0.25");
    }

    #[test]
    fn test_format_negative_zero() {
        assert_eq!(format(&from(Special::NegZero)), "0");
    }

    #[test]
    fn test_format_specials() {
        assert_eq!(format(&nan()), "NaN");
        assert_eq!(format(&infinity()), "Infinity");
        assert_eq!(format(&from(Special::NegInfinity)), "-Infinity");
    }

    #[test]
    fn test_format_rounds_to_sixteen_decimals() {
        let third = from(1) / 3u32;
        assert_eq!(format(&third), "0.3333333333333333");
        assert_eq!(format(&pi()), "3.1415926535897932");
    }

    #[test]
    fn test_fmod_keeps_dividend_sign() {
        assert_eq!(format(&fmod(&from(10), &from(3))), "1");
        assert_eq!(format(&fmod(&from(-10), &from(3))), "-1");
        assert_eq!(format(&fmod(&from(5.5), &from(2))), "1.5");
    }

    #[test]
    fn test_to_int32_wraps() {
        assert_eq!(to_int32(&from(7.9)), 7);
        assert_eq!(to_int32(&from(-7.9)), -7);
        assert_eq!(to_int32(&from(4_294_967_297u64)), 1);
        assert_eq!(to_int32(&nan()), 0);
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(&from(2)), Some(2));
        assert_eq!(to_index(&from(1.5)), None);
        assert_eq!(to_index(&from(-1)), None);
    }

    #[test]
    fn test_phi_value() {
        assert_eq!(format(&phi()), "1.6180339887498948");
    }
}
