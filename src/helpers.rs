use chrono::{DateTime, NaiveDateTime, Utc};
use ethers::{types::U256, utils::hex};
use log::debug;

use crate::greenfield::{Error, Result};

/// Decimal places of on-chain `sdk.Dec` values.
pub const DEC_PRECISION: usize = 18;

pub const GRANT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
pub const MEMBER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Turns an integer string scaled by 10^18 into fixed point with 18 fractional digits.
/// Input that already carries a decimal point is returned unchanged.
pub fn unscale_decimal(value: &str) -> Result<String> {
    if value.contains('.') {
        return Ok(value.to_string());
    }
    let (sign, digits) = match value.trim().strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value.trim()),
    };
    let scaled = U256::from_dec_str(digits)
        .map_err(|e| Error::Encoding(format!("invalid scaled decimal {value}: {e}")))?;
    let (whole, fraction) = scaled.div_mod(U256::exp10(DEC_PRECISION));
    let unscaled = format!(
        "{sign}{whole}.{:0>width$}",
        fraction.to_string(),
        width = DEC_PRECISION
    );
    debug!("unscaled {value} to {unscaled}");
    Ok(unscaled)
}

/// Renders a decimal string with exactly 18 fractional digits without rescaling it.
pub fn pad_decimal(value: &str) -> Result<String> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let valid = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let unsigned_whole = whole.strip_prefix('-').unwrap_or(whole);
    if unsigned_whole.is_empty() || !valid(unsigned_whole) || !valid(fraction) {
        return Err(Error::Encoding(format!("invalid decimal {value}")));
    }
    if fraction.len() > DEC_PRECISION {
        return Err(Error::Encoding(format!(
            "decimal {value} has more than {DEC_PRECISION} fractional digits"
        )));
    }
    Ok(format!("{whole}.{fraction:0<width$}", width = DEC_PRECISION))
}

/// Division through `f64`, kept for `commission.max_rate` whose chain-side JSON is produced
/// the same lossy way.
pub fn unscale_decimal_lossy(value: &str) -> Result<String> {
    let scaled = value
        .trim()
        .parse::<u128>()
        .map_err(|e| Error::Encoding(format!("invalid scaled decimal {value}: {e}")))?;
    Ok(format!(
        "{:.prec$}",
        scaled as f64 / 1e18,
        prec = DEC_PRECISION
    ))
}

/// Accepts RFC 3339 text or unix seconds. Null and empty text mean unset.
pub fn parse_timestamp(value: &serde_json::Value) -> Result<Option<NaiveDateTime>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.naive_utc()))
            .map_err(|e| Error::Encoding(format!("invalid timestamp {s}: {e}"))),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|t| Some(t.naive_utc()))
            .ok_or_else(|| Error::Encoding(format!("invalid unix timestamp {n}"))),
        other => Err(Error::Encoding(format!("invalid timestamp {other}"))),
    }
}

pub fn unix_epoch() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim().trim_start_matches("0x"))
        .map_err(|e| Error::Encoding(format!("invalid hex: {e}")))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
