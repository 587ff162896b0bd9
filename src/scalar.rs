//! The scalar codec (§4.4): text ↔ typed scalar conversions.

use crate::error::CyamlError;
use crate::schema::{EnumMember, FlagMember, FloatWidth, IntWidth};

fn strip_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// Parse a signed integer literal (decimal or `0x`/`0X` hex, optional sign,
/// surrounding whitespace trimmed) and range-check it against `width`.
pub fn parse_int(text: &str, width: IntWidth) -> Result<i64, CyamlError> {
    let trimmed = text.trim();
    let (negative, digits) = strip_sign(trimmed);
    let magnitude: u64 = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map_err(|_| invalid_scalar(text, "integer"))?
    } else {
        digits
            .parse::<u64>()
            .map_err(|_| invalid_scalar(text, "integer"))?
    };

    let (lo, hi) = width.signed_range();
    let value: i64 = if negative {
        // `magnitude` may equal `i64::MIN`'s unsigned magnitude
        // (9223372036854775808), one past `i64::MAX` — `i64::try_from` would
        // reject it even though it negates to a representable `i64`.
        if magnitude == i64::MIN.unsigned_abs() {
            i64::MIN
        } else {
            let v = i64::try_from(magnitude).map_err(|_| invalid_scalar(text, "integer"))?;
            v.checked_neg().ok_or_else(|| invalid_scalar(text, "integer"))?
        }
    } else {
        i64::try_from(magnitude).map_err(|_| invalid_scalar(text, "integer"))?
    };
    if value < lo || value > hi {
        return Err(invalid_scalar(text, "integer"));
    }
    Ok(value)
}

/// Parse an unsigned integer literal (decimal or `0x`/`0X` hex, optional `+`,
/// surrounding whitespace trimmed) and range-check it against `width`.
pub fn parse_uint(text: &str, width: IntWidth) -> Result<u64, CyamlError> {
    let trimmed = text.trim();
    let (negative, digits) = strip_sign(trimmed);
    if negative {
        return Err(invalid_scalar(text, "unsigned integer"));
    }
    let value: u64 = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map_err(|_| invalid_scalar(text, "unsigned integer"))?
    } else {
        digits
            .parse::<u64>()
            .map_err(|_| invalid_scalar(text, "unsigned integer"))?
    };
    let (_, hi) = width.unsigned_range();
    if value > hi {
        return Err(invalid_scalar(text, "unsigned integer"));
    }
    Ok(value)
}

/// Render a signed integer in minimal decimal form.
#[must_use]
pub fn render_int(value: i64) -> String {
    value.to_string()
}

/// Render an unsigned integer in minimal decimal form.
#[must_use]
pub fn render_uint(value: u64) -> String {
    value.to_string()
}

/// Parse a YAML float literal. Accepts the standard forms `f64::from_str`
/// recognizes plus the YAML 1.1 special spellings `.inf`/`-.inf`/`.nan`.
pub fn parse_float(text: &str, _width: FloatWidth) -> Result<f64, CyamlError> {
    let trimmed = text.trim();
    let normalized = match trimmed.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => "inf".to_string(),
        "-.inf" => "-inf".to_string(),
        ".nan" => "NaN".to_string(),
        _ => trimmed.to_string(),
    };
    normalized
        .parse::<f64>()
        .map_err(|_| invalid_scalar(text, "float"))
}

/// Render a float with enough precision to round-trip (`f32` values are
/// rendered after a round-trip through `f32` so their shortest
/// representation is used, matching the declared width).
#[must_use]
pub fn render_float(value: f64, width: FloatWidth) -> String {
    match width {
        FloatWidth::W4 => format!("{}", value as f32),
        FloatWidth::W8 => format!("{value}"),
    }
}

/// Parse a boolean. Accepts, case-insensitively: `true`/`false`, `yes`/`no`,
/// `on`/`off`, `enable`/`disable`, and the integers `0`/`1`.
pub fn parse_bool(text: &str) -> Result<bool, CyamlError> {
    let trimmed = text.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "enable" | "1" => Ok(true),
        "false" | "no" | "off" | "disable" | "0" => Ok(false),
        _ => Err(CyamlError::InvalidBool {
            value: text.to_string(),
        }),
    }
}

/// Render the canonical lowercase boolean spelling.
#[must_use]
pub fn render_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Resolve a scalar to an enum's stored integer code (§4.4).
///
/// Exact name match first (case-insensitive iff `case_insensitive`); if no
/// name matches and `strict` is not set, fall back to an integer parse
/// against `width`; otherwise `InvalidEnum`.
pub fn parse_enum(
    text: &str,
    members: &[EnumMember],
    width: IntWidth,
    strict: bool,
    case_insensitive: bool,
) -> Result<i64, CyamlError> {
    let trimmed = text.trim();
    let found = members.iter().find(|m| {
        if case_insensitive {
            m.name.eq_ignore_ascii_case(trimmed)
        } else {
            m.name == trimmed
        }
    });
    if let Some(m) = found {
        return Ok(m.value);
    }
    if strict {
        return Err(CyamlError::InvalidEnum {
            value: text.to_string(),
        });
    }
    parse_int(trimmed, width).map_err(|_| CyamlError::InvalidEnum {
        value: text.to_string(),
    })
}

/// Render an enum's stored code. Emits the matching declared name if one
/// exists; otherwise, even in strict mode, emits the decimal integer (see
/// the Open Question in SPEC_FULL.md §9 — this follows the reference).
#[must_use]
pub fn render_enum(code: i64, members: &[EnumMember]) -> String {
    match members.iter().find(|m| m.value == code) {
        Some(m) => m.name.clone(),
        None => render_int(code),
    }
}

/// Accumulate a sequence of flag entries into a bitmask (§4.4). Named
/// entries contribute their declared bit; decimal/hex entries contribute
/// their literal value; all contributions are masked to `width`.
pub fn parse_flags<'a>(
    entries: impl Iterator<Item = &'a str>,
    members: &[FlagMember],
    width: IntWidth,
    strict: bool,
) -> Result<u64, CyamlError> {
    let (_, mask_hi) = width.unsigned_range();
    let mut bits: u64 = 0;
    for entry in entries {
        let trimmed = entry.trim();
        if let Some(m) = members.iter().find(|m| m.name == trimmed) {
            bits |= 1u64 << m.bit;
            continue;
        }
        if strict {
            return Err(CyamlError::InvalidFlag {
                value: entry.to_string(),
            });
        }
        match parse_uint(trimmed, width) {
            Ok(literal) => bits |= literal,
            Err(_) => {
                return Err(CyamlError::InvalidFlag {
                    value: entry.to_string(),
                })
            }
        }
    }
    if bits > mask_hi {
        return Err(CyamlError::InvalidFlag {
            value: bits.to_string(),
        });
    }
    Ok(bits)
}

/// Render a flags bitmask (§4.4): each declared name whose bit is set, in
/// declaration order, followed by a single residual integer carrying any
/// bits that match no declared name (omitted if that residual is zero).
#[must_use]
pub fn render_flags(bits: u64, members: &[FlagMember]) -> Vec<String> {
    let mut out = Vec::new();
    let mut matched_mask: u64 = 0;
    for m in members {
        let bit_mask = 1u64 << m.bit;
        if bits & bit_mask != 0 {
            out.push(m.name.clone());
            matched_mask |= bit_mask;
        }
    }
    let residual = bits & !matched_mask;
    if residual != 0 {
        out.push(render_uint(residual));
    }
    out
}

fn invalid_scalar(text: &str, expected: &'static str) -> CyamlError {
    CyamlError::InvalidScalar {
        value: text.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_accepts_decimal_and_hex() {
        assert_eq!(parse_int("90", IntWidth::W4).unwrap(), 90);
        assert_eq!(parse_int("-90", IntWidth::W4).unwrap(), -90);
        assert_eq!(parse_int("0x1F", IntWidth::W4).unwrap(), 31);
        assert_eq!(render_int(90), "90");
    }

    #[test]
    fn int_w8_accepts_i64_min_and_round_trips() {
        let rendered = render_int(i64::MIN);
        assert_eq!(rendered, "-9223372036854775808");
        assert_eq!(parse_int(&rendered, IntWidth::W8).unwrap(), i64::MIN);
    }

    #[test]
    fn int_rejects_overflow() {
        assert!(parse_int("128", IntWidth::W1).is_err());
        assert!(parse_int("-129", IntWidth::W1).is_err());
        assert!(parse_int("127", IntWidth::W1).is_ok());
    }

    #[test]
    fn bool_accepts_all_spellings() {
        for s in ["true", "yes", "on", "enable", "1", "TRUE", "On"] {
            assert!(parse_bool(s).unwrap(), "{s}");
        }
        for s in ["false", "no", "off", "disable", "0"] {
            assert!(!parse_bool(s).unwrap(), "{s}");
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn flags_with_unknown_bit_round_trips() {
        let members = vec![
            FlagMember::new("first", 0),
            FlagMember::new("second", 1),
            FlagMember::new("third", 2),
            FlagMember::new("fourth", 3),
            FlagMember::new("fifth", 4),
            FlagMember::new("sixth", 5),
        ];
        let bits = parse_flags(
            ["second", "fifth", "1024"].into_iter(),
            &members,
            IntWidth::W2,
            false,
        )
        .unwrap();
        assert_eq!(bits, 0b10010 | 1024);
        let rendered = render_flags(bits, &members);
        assert_eq!(rendered, vec!["second", "fifth", "1024"]);
    }

    #[test]
    fn enum_strict_save_of_out_of_range_code_emits_integer() {
        let members = vec![EnumMember::new("red", 0), EnumMember::new("blue", 1)];
        assert_eq!(render_enum(0, &members), "red");
        assert_eq!(render_enum(42, &members), "42");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn int_round_trips_within_width(value in i32::MIN..=i32::MAX) {
            let rendered = render_int(i64::from(value));
            let parsed = parse_int(&rendered, IntWidth::W4).unwrap();
            prop_assert_eq!(parsed, i64::from(value));
        }

        #[test]
        fn uint_round_trips_within_width(value in 0u32..=u32::MAX) {
            let rendered = render_uint(u64::from(value));
            let parsed = parse_uint(&rendered, IntWidth::W4).unwrap();
            prop_assert_eq!(parsed, u64::from(value));
        }

        #[test]
        fn bool_round_trips(value: bool) {
            let rendered = render_bool(value);
            prop_assert_eq!(parse_bool(rendered).unwrap(), value);
        }

        #[test]
        fn flags_round_trip_ignores_entry_order(a in 0u32..6, b in 0u32..6) {
            let members = vec![
                FlagMember::new("a0", 0),
                FlagMember::new("a1", 1),
                FlagMember::new("a2", 2),
                FlagMember::new("a3", 3),
                FlagMember::new("a4", 4),
                FlagMember::new("a5", 5),
            ];
            let bits = parse_flags(
                [members[a as usize].name.as_str(), members[b as usize].name.as_str()].into_iter(),
                &members,
                IntWidth::W1,
                true,
            )
            .unwrap();
            let rendered = render_flags(bits, &members);
            let round_tripped = parse_flags(
                rendered.iter().map(String::as_str),
                &members,
                IntWidth::W1,
                true,
            )
            .unwrap();
            prop_assert_eq!(round_tripped, bits);
        }
    }
}
