//! Parsing of textual field defaults.
//!
//! Integers follow C `strto*` with base 0: `0x` for hex, a leading `0` for
//! octal, an optional sign, and a range check against the field width.
//! Bytes defaults use C escapes.

use hpb_core::{CType, MessageValue};

/// Numeric defaults must be shorter than this.
pub const MAX_NUMERIC_DEFAULT: usize = 63;

/// Why a default failed to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultError {
    /// A numeric default of [`MAX_NUMERIC_DEFAULT`] bytes or more.
    TooLong,
    /// Not a valid value of the type.
    Invalid,
}

/// Parse `text` as a default of `ctype`.
///
/// Enum and message types are not handled here: enum defaults name a
/// value, and message fields have no default.
pub fn parse_default(ctype: CType, text: &str) -> Result<MessageValue, DefaultError> {
    let numeric = matches!(
        ctype,
        CType::Int32 | CType::Int64 | CType::UInt32 | CType::UInt64 | CType::Float | CType::Double
    );
    if numeric && text.len() >= MAX_NUMERIC_DEFAULT {
        return Err(DefaultError::TooLong);
    }
    let invalid = DefaultError::Invalid;
    Ok(match ctype {
        CType::Int32 => {
            let v = parse_signed(text).ok_or(invalid)?;
            MessageValue::Int32(i32::try_from(v).map_err(|_| invalid)?)
        }
        CType::Int64 => {
            let v = parse_signed(text).ok_or(invalid)?;
            MessageValue::Int64(i64::try_from(v).map_err(|_| invalid)?)
        }
        CType::UInt32 => {
            let v = parse_unsigned(text).ok_or(invalid)?;
            MessageValue::UInt32(u32::try_from(v).map_err(|_| invalid)?)
        }
        CType::UInt64 => {
            let v = parse_unsigned(text).ok_or(invalid)?;
            MessageValue::UInt64(u64::try_from(v).map_err(|_| invalid)?)
        }
        CType::Double => MessageValue::Double(parse_float::<f64>(text).ok_or(invalid)?),
        CType::Float => MessageValue::Float(parse_float::<f32>(text).ok_or(invalid)?),
        CType::Bool => match text {
            "true" => MessageValue::Bool(true),
            "false" => MessageValue::Bool(false),
            _ => return Err(invalid),
        },
        CType::String => MessageValue::Str(text.as_bytes().to_vec()),
        CType::Bytes => MessageValue::Str(unescape(text).ok_or(invalid)?),
        CType::Enum | CType::Message => return Err(invalid),
    })
}

/// Magnitude and sign, base detected from the prefix. An empty input
/// reads as zero, like `strtol`; a sign with no digits does not.
fn split_radix(text: &str) -> Option<(bool, u128)> {
    if text.is_empty() {
        return Some((false, 0));
    }
    let (neg, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u128::from_str_radix(digits, radix).ok().map(|v| (neg, v))
}

fn parse_signed(text: &str) -> Option<i128> {
    let (neg, mag) = split_radix(text)?;
    let mag = i128::try_from(mag).ok()?;
    Some(if neg { -mag } else { mag })
}

fn parse_unsigned(text: &str) -> Option<u128> {
    match split_radix(text)? {
        (false, v) => Some(v),
        (true, 0) => Some(0),
        (true, _) => None,
    }
}

trait Float: std::str::FromStr + Copy {
    fn is_infinite(self) -> bool;
}

impl Float for f32 {
    fn is_infinite(self) -> bool {
        f32::is_infinite(self)
    }
}

impl Float for f64 {
    fn is_infinite(self) -> bool {
        f64::is_infinite(self)
    }
}

/// Decimal floats plus `inf` and `nan`. A finite literal that overflows
/// the type is out of range.
fn parse_float<F: Float>(text: &str) -> Option<F> {
    let v: F = text.parse().ok()?;
    if v.is_infinite() && !text.to_ascii_lowercase().contains("inf") {
        return None;
    }
    Some(v)
}

/// Decode C escapes: `\a \b \f \n \r \t \v \\ \' \" \?`, up to three octal
/// digits, and `\x` with up to two hex digits.
pub fn unescape(text: &str) -> Option<Vec<u8>> {
    let src = text.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let esc = *src.get(i)?;
        i += 1;
        let decoded = match esc {
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0b,
            b'\\' | b'\'' | b'"' | b'?' => esc,
            b'0'..=b'7' => {
                let mut v = u32::from(esc - b'0');
                for _ in 0..2 {
                    match src.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            v = v * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                v as u8
            }
            b'x' => {
                let mut v: u32 = 0;
                let mut n = 0;
                while n < 2 {
                    match src.get(i).and_then(|d| (*d as char).to_digit(16)) {
                        Some(d) => {
                            v = v * 16 + d;
                            i += 1;
                            n += 1;
                        }
                        None => break,
                    }
                }
                if n == 0 {
                    return None;
                }
                v as u8
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_use_c_prefixes() {
        assert_eq!(parse_default(CType::Int32, "0x1F"), Ok(MessageValue::Int32(31)));
        assert_eq!(parse_default(CType::Int32, "010"), Ok(MessageValue::Int32(8)));
        assert_eq!(parse_default(CType::Int32, "-7"), Ok(MessageValue::Int32(-7)));
        assert_eq!(parse_default(CType::Int32, "0"), Ok(MessageValue::Int32(0)));
        assert_eq!(
            parse_default(CType::Int64, "-9223372036854775808"),
            Ok(MessageValue::Int64(i64::MIN))
        );
        assert_eq!(
            parse_default(CType::UInt64, "18446744073709551615"),
            Ok(MessageValue::UInt64(u64::MAX))
        );
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(parse_default(CType::Int32, "2147483648"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::UInt32, "4294967296"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::UInt32, "-1"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Int32, "12abc"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Int32, "09"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Int32, "0x"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Int32, "-"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Int32, ""), Ok(MessageValue::Int32(0)));
    }

    #[test]
    fn long_numeric_default_is_rejected() {
        let text = "1".repeat(MAX_NUMERIC_DEFAULT);
        assert_eq!(parse_default(CType::Int64, &text), Err(DefaultError::TooLong));
        let text = "x".repeat(200);
        assert!(parse_default(CType::String, &text).is_ok());
    }

    #[test]
    fn floats() {
        assert_eq!(parse_default(CType::Double, "1.5"), Ok(MessageValue::Double(1.5)));
        assert_eq!(parse_default(CType::Float, "-inf"), Ok(MessageValue::Float(f32::NEG_INFINITY)));
        assert!(matches!(
            parse_default(CType::Double, "nan"),
            Ok(MessageValue::Double(v)) if v.is_nan()
        ));
        assert_eq!(parse_default(CType::Float, "1e39"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Double, "1.5x"), Err(DefaultError::Invalid));
    }

    #[test]
    fn bools_are_exact() {
        assert_eq!(parse_default(CType::Bool, "true"), Ok(MessageValue::Bool(true)));
        assert_eq!(parse_default(CType::Bool, "false"), Ok(MessageValue::Bool(false)));
        assert_eq!(parse_default(CType::Bool, "True"), Err(DefaultError::Invalid));
        assert_eq!(parse_default(CType::Bool, "1"), Err(DefaultError::Invalid));
    }

    #[test]
    fn strings_are_verbatim_and_bytes_unescaped() {
        assert_eq!(
            parse_default(CType::String, "a\\nb"),
            Ok(MessageValue::Str(b"a\\nb".to_vec()))
        );
        assert_eq!(
            parse_default(CType::Bytes, "a\\nb\\001\\x41\\\\"),
            Ok(MessageValue::Str(b"a\nb\x01A\\".to_vec()))
        );
    }

    #[test]
    fn bad_escapes() {
        assert_eq!(unescape("\\"), None);
        assert_eq!(unescape("\\q"), None);
        assert_eq!(unescape("\\xg"), None);
        assert_eq!(unescape("\\377\\0"), Some(vec![0xff, 0]));
        assert_eq!(unescape("\\?\\'\\\""), Some(b"?'\"".to_vec()));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decimal_i32_matches_std(v in any::<i32>()) {
                prop_assert_eq!(parse_default(CType::Int32, &v.to_string()), Ok(MessageValue::Int32(v)));
            }

            #[test]
            fn hex_u64_matches_std(v in any::<u64>()) {
                let text = format!("0x{v:x}");
                prop_assert_eq!(parse_default(CType::UInt64, &text), Ok(MessageValue::UInt64(v)));
            }

            #[test]
            fn plain_text_unescapes_to_itself(s in "[a-zA-Z0-9 ]{0,32}") {
                prop_assert_eq!(unescape(&s), Some(s.as_bytes().to_vec()));
            }
        }
    }
}
