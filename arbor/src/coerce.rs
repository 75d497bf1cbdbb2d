//! Safe casting of raw values to primitive targets.
//!
//! Every conversion answers "no value" (`None`) instead of failing, so callers
//! can fall back to defaults. The rules, in order:
//!
//! 1. [`Value::Null`] never converts.
//! 2. A value already in the target's family converts directly. Numeric
//!    narrowing truncates toward zero and then keeps the low bits of the
//!    target width, exactly like a primitive narrowing cast.
//! 3. Any other scalar is rendered as text and parsed; a parse failure is a
//!    miss. Byte sequences, lists and maps are never parsed.
//!
//! Booleans only accept booleans or the literals `true`/`false`. Dates accept
//! epoch milliseconds or a handful of textual layouts. Byte sequences accept
//! nothing but byte sequences.

use std::borrow::Cow;
use std::str::FromStr;

use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::value::Value;

/// A target type that values can be coerced into.
///
/// # Examples
///
/// ```
/// use arbor::coerce::coerce;
/// use arbor::Value;
///
/// assert_eq!(coerce::<bool>(&Value::from("true")), Some(true));
/// assert_eq!(coerce::<bool>(&Value::from("notabool")), None);
/// assert_eq!(coerce::<i32>(&Value::from(42.9)), Some(42));
/// assert_eq!(coerce::<i32>(&Value::Null), None);
/// ```
pub trait Coerce: Sized {
    /// Attempts the conversion, returning `None` on a miss.
    fn coerce(value: &Value) -> Option<Self>;
}

/// Coerces `value` into `T`.
pub fn coerce<T: Coerce>(value: &Value) -> Option<T> {
    T::coerce(value)
}

/// The text a scalar parses from. Null, bytes and containers have none.
fn text_of(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null | Value::Bytes(_) | Value::List(_) | Value::Map(_) => None,
        Value::String(s) => Some(Cow::Borrowed(s)),
        other => Some(Cow::Owned(other.to_string())),
    }
}

fn parse_text<T: FromStr>(value: &Value) -> Option<T> {
    text_of(value)?.parse().ok()
}

/// The low 64 bits of a big integer in two's complement.
fn low_bits(n: &BigInt) -> i64 {
    let (sign, digits) = n.to_u64_digits();
    let magnitude = digits.first().copied().unwrap_or(0);
    let bits = if sign == Sign::Minus {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };
    i64::from_ne_bytes(bits.to_ne_bytes())
}

/// Drops the fractional part of a decimal, rounding toward zero.
fn truncate(n: &BigDecimal) -> BigInt {
    let (digits, _) = n.with_scale(0).into_bigint_and_exponent();
    digits
}

/// 64-bit view of a numeric value, with float-to-integer saturation.
#[allow(clippy::cast_possible_truncation)]
fn long_value(value: &Value) -> Option<i64> {
    Some(match value {
        Value::I8(n) => i64::from(*n),
        Value::I16(n) => i64::from(*n),
        Value::I32(n) => i64::from(*n),
        Value::I64(n) => *n,
        Value::F32(n) => *n as i64,
        Value::F64(n) => *n as i64,
        Value::BigInt(n) => low_bits(n),
        Value::Decimal(n) => low_bits(&truncate(n)),
        _ => return None,
    })
}

/// 32-bit view of a numeric value; floats saturate at the 32-bit range.
#[allow(clippy::cast_possible_truncation)]
fn int_value(value: &Value) -> Option<i32> {
    match value {
        Value::F32(n) => Some(*n as i32),
        Value::F64(n) => Some(*n as i32),
        other => long_value(other).map(|n| n as i32),
    }
}

#[allow(clippy::cast_precision_loss)]
fn double_value(value: &Value) -> Option<f64> {
    match value {
        Value::I8(n) => Some(f64::from(*n)),
        Value::I16(n) => Some(f64::from(*n)),
        Value::I32(n) => Some(f64::from(*n)),
        Value::I64(n) => Some(*n as f64),
        Value::F32(n) => Some(f64::from(*n)),
        Value::F64(n) => Some(*n),
        Value::BigInt(n) => n.to_f64(),
        Value::Decimal(n) => n.to_f64(),
        _ => None,
    }
}

impl Coerce for i64 {
    fn coerce(value: &Value) -> Option<Self> {
        long_value(value).or_else(|| parse_text(value))
    }
}

impl Coerce for i32 {
    fn coerce(value: &Value) -> Option<Self> {
        int_value(value).or_else(|| parse_text(value))
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Coerce for i16 {
    fn coerce(value: &Value) -> Option<Self> {
        int_value(value)
            .map(|n| n as i16)
            .or_else(|| parse_text(value))
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Coerce for i8 {
    fn coerce(value: &Value) -> Option<Self> {
        int_value(value)
            .map(|n| n as i8)
            .or_else(|| parse_text(value))
    }
}

impl Coerce for f64 {
    fn coerce(value: &Value) -> Option<Self> {
        double_value(value).or_else(|| parse_text(value))
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Coerce for f32 {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::F32(n) => Some(*n),
            Value::BigInt(n) => n.to_f32(),
            Value::Decimal(n) => n.to_f32(),
            other => double_value(other)
                .map(|n| n as f32)
                .or_else(|| parse_text(other)),
        }
    }
}

impl Coerce for BigInt {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::BigInt(n) => Some(n.clone()),
            Value::Decimal(n) => Some(truncate(n)),
            other if other.is_number() => long_value(other).map(BigInt::from),
            other => parse_text(other),
        }
    }
}

impl Coerce for BigDecimal {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(n) => Some(n.clone()),
            Value::BigInt(n) => Some(BigDecimal::from(n.clone())),
            Value::F32(_) | Value::F64(_) => {
                let f = double_value(value)?;
                if f.is_finite() {
                    BigDecimal::from_str(&f.to_string()).ok()
                } else {
                    None
                }
            }
            other if other.is_number() => long_value(other).map(BigDecimal::from),
            other => parse_text(other),
        }
    }
}

impl Coerce for bool {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

impl Coerce for String {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl Coerce for Vec<u8> {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }
}

impl Coerce for DateTime<Utc> {
    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Date(d) => Some(*d),
            other => match i64::coerce(other) {
                Some(millis) => Utc.timestamp_millis_opt(millis).single(),
                None => text_of(other).and_then(|text| parse_date(&text)),
            },
        }
    }
}

const DATE_TIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%b %d, %Y %I:%M:%S %p",
];
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%b %d, %Y"];
const TIME_LAYOUTS: &[&str] = &["%H:%M:%S", "%I:%M:%S %p"];
const GENERIC_LAYOUTS: &[&str] = &["%m/%d/%y %I:%M %p", "%m/%d/%Y %H:%M"];

/// Tries date-time, then date-only, then time-only, then generic layouts.
/// Times without a date land on the epoch day; everything is read as UTC.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    let naive_datetime = |layouts: &[&str]| {
        layouts
            .iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
    };

    naive_datetime(DATE_TIME_LAYOUTS)
        .or_else(|| {
            DATE_LAYOUTS.iter().find_map(|layout| {
                NaiveDate::parse_from_str(text, layout)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
        .or_else(|| {
            TIME_LAYOUTS.iter().find_map(|layout| {
                NaiveTime::parse_from_str(text, layout)
                    .ok()
                    .and_then(|t| NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(t)))
            })
        })
        .or_else(|| naive_datetime(GENERIC_LAYOUTS))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|| {
            DateTime::parse_from_rfc2822(text)
                .ok()
                .map(|d| d.with_timezone(&Utc))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_never_coerces() {
        assert_eq!(coerce::<i32>(&Value::Null), None);
        assert_eq!(coerce::<bool>(&Value::Null), None);
        assert_eq!(coerce::<String>(&Value::Null), None);
        assert_eq!(coerce::<DateTime<Utc>>(&Value::Null), None);
        assert_eq!(coerce::<BigInt>(&Value::Null), None);
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(coerce::<i32>(&Value::F64(42.9)), Some(42));
        assert_eq!(coerce::<i32>(&Value::F64(-42.9)), Some(-42));
        assert_eq!(coerce::<i64>(&Value::F32(7.99)), Some(7));
    }

    #[test]
    fn test_integer_narrowing_keeps_low_bits() {
        assert_eq!(coerce::<i8>(&Value::I32(300)), Some(44));
        assert_eq!(coerce::<i16>(&Value::I64(70_000)), Some(4464));
        assert_eq!(coerce::<i32>(&Value::I64(1 << 32)), Some(0));
    }

    #[test]
    fn test_float_narrowing_saturates_at_int_width() {
        assert_eq!(coerce::<i32>(&Value::F64(1e12)), Some(i32::MAX));
        assert_eq!(coerce::<i8>(&Value::F64(1e12)), Some(-1));
    }

    #[test]
    fn test_big_number_narrowing() {
        let big: BigInt = "18446744073709551617".parse().unwrap();
        assert_eq!(coerce::<i64>(&Value::BigInt(big)), Some(1));
        let neg = BigInt::from(-5);
        assert_eq!(coerce::<i64>(&Value::BigInt(neg)), Some(-5));
        let dec = BigDecimal::from_str("-12.75").unwrap();
        assert_eq!(coerce::<i32>(&Value::Decimal(dec)), Some(-12));
    }

    #[test]
    fn test_string_parsing() {
        assert_eq!(coerce::<i32>(&Value::from("42")), Some(42));
        assert_eq!(coerce::<i32>(&Value::from("42.9")), None);
        assert_eq!(coerce::<i8>(&Value::from("300")), None);
        assert_eq!(coerce::<f64>(&Value::from("2.5")), Some(2.5));
        assert_eq!(coerce::<i64>(&Value::from("abc")), None);
    }

    #[test]
    fn test_bool_rules() {
        assert_eq!(coerce::<bool>(&Value::from("true")), Some(true));
        assert_eq!(coerce::<bool>(&Value::from("FALSE")), Some(false));
        assert_eq!(coerce::<bool>(&Value::from("notabool")), None);
        assert_eq!(coerce::<bool>(&Value::I32(1)), None);
        assert_eq!(coerce::<bool>(&Value::Bool(false)), Some(false));
    }

    #[test]
    fn test_bool_does_not_become_number() {
        assert_eq!(coerce::<i32>(&Value::Bool(true)), None);
    }

    #[test]
    fn test_big_values_from_text() {
        let big = coerce::<BigInt>(&Value::from("123456789012345678901234567890")).unwrap();
        assert_eq!(big.to_string(), "123456789012345678901234567890");
        let dec = coerce::<BigDecimal>(&Value::from("0.1")).unwrap();
        assert_eq!(dec, BigDecimal::from_str("0.1").unwrap());
        assert_eq!(
            coerce::<BigDecimal>(&Value::F64(0.1)),
            Some(BigDecimal::from_str("0.1").unwrap())
        );
        assert_eq!(coerce::<BigDecimal>(&Value::F64(f64::NAN)), None);
    }

    #[test]
    fn test_date_from_epoch_millis() {
        let date = coerce::<DateTime<Utc>>(&Value::I64(1_000)).unwrap();
        assert_eq!(date.timestamp_millis(), 1_000);
        let from_text = coerce::<DateTime<Utc>>(&Value::from("2000")).unwrap();
        assert_eq!(from_text.timestamp_millis(), 2_000);
    }

    #[test]
    fn test_date_layouts() {
        let full = coerce::<DateTime<Utc>>(&Value::from("2024-03-01 12:30:00")).unwrap();
        assert_eq!(full.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        let day = coerce::<DateTime<Utc>>(&Value::from("2024-03-01")).unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let time = coerce::<DateTime<Utc>>(&Value::from("08:15:00")).unwrap();
        assert_eq!(time.to_rfc3339(), "1970-01-01T08:15:00+00:00");

        let rfc = coerce::<DateTime<Utc>>(&Value::from("2024-03-01T12:30:00Z")).unwrap();
        assert_eq!(rfc, full);

        assert_eq!(coerce::<DateTime<Utc>>(&Value::from("next tuesday")), None);
    }

    #[test]
    fn test_bytes_only_from_bytes() {
        assert_eq!(
            coerce::<Vec<u8>>(&Value::Bytes(vec![1, 2])),
            Some(vec![1, 2])
        );
        assert_eq!(coerce::<Vec<u8>>(&Value::list([1, 2])), None);
        assert_eq!(coerce::<Vec<u8>>(&Value::list(["x"])), None);
        assert_eq!(coerce::<Vec<u8>>(&Value::from("ab")), None);
        assert_eq!(coerce::<Vec<u8>>(&Value::I32(7)), None);
    }

    #[test]
    fn test_bytes_and_containers_are_not_parsed() {
        let bytes = Value::Bytes(vec![0x12, 0x34]);
        assert_eq!(coerce::<i32>(&bytes), None);
        assert_eq!(coerce::<i64>(&bytes), None);
        assert_eq!(coerce::<f64>(&bytes), None);
        assert_eq!(coerce::<BigInt>(&bytes), None);
        assert_eq!(coerce::<BigDecimal>(&bytes), None);
        assert_eq!(coerce::<DateTime<Utc>>(&bytes), None);

        assert_eq!(coerce::<i32>(&Value::list([5])), None);
        assert_eq!(coerce::<DateTime<Utc>>(&Value::list(["2024-03-01"])), None);
        assert_eq!(coerce::<i64>(&Value::map([("a", 1)])), None);
    }

    #[test]
    fn test_string_from_scalars() {
        assert_eq!(coerce::<String>(&Value::I32(5)), Some("5".to_string()));
        assert_eq!(coerce::<String>(&Value::Bool(true)), Some("true".to_string()));
    }
}
