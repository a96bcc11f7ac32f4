//! Boundary coercion for user-entered numbers and ids.
//!
//! Drafts arrive from forms where a rate may be `"0.85"`, `0.85`, `""`
//! or garbage, and a select may send `3`, `"3"` or `""`. Everything that
//! is not a number becomes `None` here so nothing downstream ever sees a
//! `NaN`-like value.
//!
//! JSON numbers are read through `serde_json::Number` with
//! `arbitrary_precision`, so their original digits reach `Decimal`
//! without a detour through `f64`.

use crate::models::RouteType;
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::Number;
use std::str::FromStr;

/// Parse a decimal, tolerating surrounding whitespace.
///
/// Scientific notation is accepted (`"1e3"`); anything else that fails
/// to parse is `None`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Parse a reference id; blanks, negatives and fractions are `None`.
pub fn parse_id(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

/// `Some(v)` only when `v > 0`.
pub fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| v.is_sign_positive() && !v.is_zero())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInput {
    Text(String),
    Number(Number),
    Junk(IgnoredAny),
}

/// `deserialize_with` helper: number, numeric string, or `None`.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawInput>::deserialize(deserializer)? {
        Some(RawInput::Text(s)) => parse_decimal(&s),
        Some(RawInput::Number(n)) => parse_decimal(&n.to_string()),
        Some(RawInput::Junk(_)) | None => None,
    })
}

/// `deserialize_with` helper for commission and company references:
/// `3` and `"3"` are ids, anything else is unset.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawInput>::deserialize(deserializer)? {
        Some(RawInput::Text(s)) => parse_id(&s),
        Some(RawInput::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(RawInput::Junk(_)) | None => None,
    })
}

/// `deserialize_with` helper: empty or unknown route types are unset.
pub fn lenient_route_type<'de, D>(deserializer: D) -> Result<Option<RouteType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawInput>::deserialize(deserializer)? {
        Some(RawInput::Text(s)) => RouteType::parse(&s),
        Some(RawInput::Number(_)) | Some(RawInput::Junk(_)) | None => None,
    })
}
