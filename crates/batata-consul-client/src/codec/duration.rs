//! Duration text (`"1h2m3.5s"`, `"150ms"`) used throughout the Consul API.
//!
//! Consul encodes durations either as this text form or as an integer count of
//! nanoseconds depending on the endpoint. The serde helpers here accept both on
//! the way in and write the form the endpoint expects on the way out.

use std::time::Duration;

use crate::error::{ConsulError, Result};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Parse a duration such as `"300ms"`, `"1.5h"` or `"2h45m"`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `"0"` is
/// accepted. Negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || ConsulError::InvalidArgument(format!("invalid duration '{input}'"));

    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if s.starts_with('-') {
        return Err(ConsulError::InvalidArgument(format!(
            "negative duration '{input}'"
        )));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, rest) = s.split_at(int_len);
        s = rest;

        let mut frac_part = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &rest[..frac_len];
            s = &rest[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = s
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (unit, rest) = s.split_at(unit_len);
        s = rest;

        let scale = match unit {
            "ns" => 1,
            "us" | "\u{00b5}s" | "\u{03bc}s" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            "" => {
                return Err(ConsulError::InvalidArgument(format!(
                    "missing unit in duration '{input}'"
                )));
            }
            other => {
                return Err(ConsulError::InvalidArgument(format!(
                    "unknown unit '{other}' in duration '{input}'"
                )));
            }
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(invalid)?;

        if !frac_part.is_empty() {
            // digits beyond nanosecond precision cannot change the result
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| invalid())?;
            let denom = 10u128.pow(digits.len() as u32);
            value = value.checked_add(frac * scale / denom).ok_or_else(invalid)?;
        }

        total = total.checked_add(value).ok_or_else(invalid)?;
    }

    let nanos = u64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::from_nanos(nanos))
}

/// Format a duration as canonical API text, e.g. `"1h0m0s"`,
/// `"1m30s"`, `"1.5s"`, `"150ms"`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}us", fixed(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SECOND {
        return format!("{}ms", fixed(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = fixed(nanos % NANOS_PER_MINUTE, NANOS_PER_SECOND);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

/// `value / unit` with the fractional digits trimmed of trailing zeros
fn fixed(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = (unit.ilog10()) as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

fn from_json_value<E: serde::de::Error>(
    value: serde_json::Value,
) -> std::result::Result<Duration, E> {
    match value {
        serde_json::Value::String(s) if s.is_empty() => Ok(Duration::ZERO),
        serde_json::Value::String(s) => parse_duration(&s).map_err(E::custom),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(Duration::from_nanos)
            .ok_or_else(|| E::custom(format!("invalid nanosecond duration {n}"))),
        other => Err(E::custom(format!("expected duration, found {other}"))),
    }
}

/// Serde helpers writing `Duration` as duration text, reading text or nanoseconds
pub mod text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        super::from_json_value(value)
    }
}

/// Same as [`text`] for `Option<Duration>`; `null`, `""` and a missing field read as `None`
pub mod text_option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        d: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => serializer.serialize_str(&super::format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => super::from_json_value(value).map(Some),
        }
    }
}

/// Serde helpers writing `Duration` as an integer count of nanoseconds
pub mod nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        super::from_json_value(value)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("7us").unwrap(), Duration::from_micros(7));
        assert_eq!(parse_duration("7µs").unwrap(), Duration::from_micros(7));
        assert_eq!(parse_duration("42ns").unwrap(), Duration::from_nanos(42));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h2m3s").unwrap(), Duration::from_secs(3723));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(
            parse_duration("1m0.000000001s").unwrap(),
            Duration::new(60, 1)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("99999999999999999999h").is_err());
        assert!(parse_duration("94522879700260684295381835.999999999999999999h").is_err());
    }

    #[test]
    fn test_format_canonical_text() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(12)), "12ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.5us");
        assert_eq!(format_duration(Duration::from_millis(150)), "150ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(15)), "15s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(86400)), "24h0m0s");
    }

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(rename = "TTL", with = "text")]
        ttl: Duration,
        #[serde(
            rename = "Delay",
            default,
            with = "text_option",
            skip_serializing_if = "Option::is_none"
        )]
        delay: Option<Duration>,
        #[serde(rename = "LockDelay", with = "nanos")]
        lock_delay: Duration,
    }

    #[test]
    fn test_serde_helpers() {
        let h: Holder =
            serde_json::from_str(r#"{"TTL":"30s","Delay":null,"LockDelay":15000000000}"#).unwrap();
        assert_eq!(h.ttl, Duration::from_secs(30));
        assert!(h.delay.is_none());
        assert_eq!(h.lock_delay, Duration::from_secs(15));

        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"TTL":"30s","LockDelay":15000000000}"#);

        let h: Holder = serde_json::from_str(r#"{"TTL":"1s","Delay":"","LockDelay":0}"#).unwrap();
        assert!(h.delay.is_none());
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"TTL":"1s","LockDelay":0}"#);

        // text helper also reads nanoseconds, nanos helper also reads text
        let h: Holder =
            serde_json::from_str(r#"{"TTL":1000000000,"Delay":"2m","LockDelay":"1s"}"#).unwrap();
        assert_eq!(h.ttl, Duration::from_secs(1));
        assert_eq!(h.delay, Some(Duration::from_secs(120)));
        assert_eq!(h.lock_delay, Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(nanos in 0u64..u64::MAX / 2) {
            let d = Duration::from_nanos(nanos);
            prop_assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }
}
