//! Signing context extraction from HTTP requests.

use axum::http::HeaderMap;

use crate::error::EvidenceError;
use crate::evidence::metadata::{Geolocation, SignatureMetadata};

/// Client address: first hop of `x-forwarded-for`, else `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .map(str::to_string)
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Build signing metadata from request headers plus client-supplied
/// fingerprint and position.
pub fn metadata_from_headers(
    headers: &HeaderMap,
    fingerprint: Option<String>,
    geolocation: Option<Geolocation>,
    timestamp_utc: impl Into<String>,
) -> Result<SignatureMetadata, EvidenceError> {
    if let Some(geo) = &geolocation {
        geo.validate()?;
    }

    let metadata = SignatureMetadata {
        ip: client_ip(headers),
        user_agent: user_agent(headers),
        fingerprint,
        timestamp_utc: timestamp_utc.into(),
        geolocation,
    };
    metadata.timestamp()?;
    Ok(metadata)
}
