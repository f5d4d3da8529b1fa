//! License token decoding and signature verification.
//!
//! A license token is base64 of `{"data": {...}, "signature": "..."}`. The
//! signature is RSASSA-PKCS1-v1_5 with SHA-256 over the compact JSON of
//! `data`, keys in their original order.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};

/// Why a token could not be turned into a trusted [`LicenseData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodeFailure {
    Format,
    Signature,
}

#[derive(Deserialize)]
struct Envelope {
    data: serde_json::Value,
    signature: String,
}

/// The signed license record.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LicenseData {
    pub organization: Option<String>,
    #[serde(rename = "licenseeEmail")]
    pub licensee_email: Option<String>,
    pub tier: Option<String>,
    #[serde(rename = "startDateUTC")]
    pub start_date: Option<String>,
    #[serde(rename = "paidEndDateUTC")]
    pub paid_end_date: Option<String>,
    #[serde(rename = "freeEndDateUTC")]
    pub free_end_date: Option<String>,
}

/// License attributes shown to the user once a license checks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    pub organization: String,
    pub email: String,
    pub tier: String,
    /// End of the period the license is currently valid for.
    pub expires_at: Option<DateTime<Utc>>,
    pub is_paid: bool,
}

/// Decode a token and verify its signature.
pub(crate) fn decode_token(
    token: &str,
    key: &DecodingKey,
) -> std::result::Result<LicenseData, DecodeFailure> {
    let raw = STANDARD
        .decode(token.trim())
        .map_err(|_| DecodeFailure::Format)?;
    let envelope: Envelope = serde_json::from_slice(&raw).map_err(|_| DecodeFailure::Format)?;
    if !envelope.data.is_object() {
        return Err(DecodeFailure::Format);
    }

    let message = serde_json::to_string(&envelope.data).map_err(|_| DecodeFailure::Format)?;
    let signature = normalize_signature(&envelope.signature).ok_or(DecodeFailure::Format)?;

    match jsonwebtoken::crypto::verify(&signature, message.as_bytes(), key, Algorithm::RS256) {
        Ok(true) => {}
        Ok(false) | Err(_) => return Err(DecodeFailure::Signature),
    }

    serde_json::from_value(envelope.data).map_err(|_| DecodeFailure::Format)
}

/// Re-encode a standard or URL-safe base64 signature as unpadded URL-safe.
fn normalize_signature(signature: &str) -> Option<String> {
    let signature = signature.trim();
    let bytes = STANDARD
        .decode(signature)
        .or_else(|_| URL_SAFE_NO_PAD.decode(signature.trim_end_matches('=')))
        .ok()?;
    Some(URL_SAFE_NO_PAD.encode(bytes))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
///
/// Bare dates mean the start of the day for start dates and the last
/// second of the day for end dates.
pub(crate) fn parse_date(value: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time).and_utc())
}
