//! Signing Context Metadata
//!
//! Captures where and how a signature was produced and turns it into a
//! canonical string for hashing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;

/// Client position reported at signing time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Geolocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn validate(&self) -> Result<(), EvidenceError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(EvidenceError::InvalidMetadata(format!(
                "latitude out of range: {}",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(EvidenceError::InvalidMetadata(format!(
                "longitude out of range: {}",
                self.lng
            )));
        }
        if let Some(accuracy) = self.accuracy {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(EvidenceError::InvalidMetadata(format!(
                    "invalid accuracy: {}",
                    accuracy
                )));
            }
        }
        Ok(())
    }

    /// Fixed-order JSON form: `{"lat":..,"lng":..[,"accuracy":..]}`.
    ///
    /// Numbers are written the way browsers serialise them, so whole
    /// values carry no fractional part (`20`, not `20.0`).
    pub fn canonical_string(&self) -> Result<String, EvidenceError> {
        self.validate()?;
        let mut out = format!(
            "{{\"lat\":{},\"lng\":{}",
            js_number(self.lat)?,
            js_number(self.lng)?
        );
        if let Some(accuracy) = self.accuracy {
            out.push_str(&format!(",\"accuracy\":{}", js_number(accuracy)?));
        }
        out.push('}');
        Ok(out)
    }
}

/// Largest magnitude below which every whole f64 prints as plain digits.
const MAX_WHOLE_NUMBER: f64 = 9_007_199_254_740_992.0;

fn js_number(value: f64) -> Result<String, EvidenceError> {
    if value.fract() == 0.0 && value.abs() < MAX_WHOLE_NUMBER {
        // -0 prints as 0
        return Ok((value as i64).to_string());
    }
    Ok(serde_json::to_string(&value)?)
}

/// Context captured alongside a signature.
///
/// Optional fields are omitted from the stored JSON when absent and
/// hashed as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// ISO-8601 UTC instant supplied by the caller. Hashed verbatim.
    #[serde(default)]
    pub timestamp_utc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
}

impl SignatureMetadata {
    pub fn new(timestamp_utc: impl Into<String>) -> Self {
        Self {
            timestamp_utc: timestamp_utc.into(),
            ..Default::default()
        }
    }

    /// Metadata stamped with the current time, millisecond precision.
    pub fn now() -> Self {
        Self::new(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_geolocation(mut self, geolocation: Geolocation) -> Self {
        self.geolocation = Some(geolocation);
        self
    }

    /// Parsed signing instant.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, EvidenceError> {
        if self.timestamp_utc.trim().is_empty() {
            return Err(EvidenceError::InvalidMetadata(
                "timestamp_utc is required".to_string(),
            ));
        }
        DateTime::parse_from_rfc3339(&self.timestamp_utc)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                EvidenceError::InvalidMetadata(format!(
                    "timestamp_utc {:?} is not ISO-8601: {}",
                    self.timestamp_utc, e
                ))
            })
    }
}

#[derive(Serialize)]
struct CanonicalMetadata<'a> {
    ip: &'a str,
    #[serde(rename = "userAgent")]
    user_agent: &'a str,
    fingerprint: &'a str,
    #[serde(rename = "timestampUtc")]
    timestamp_utc: &'a str,
    geolocation: String,
}

/// Serialize `metadata` into its canonical hash input.
///
/// The result is a compact JSON object with keys in the fixed order
/// `ip`, `userAgent`, `fingerprint`, `timestampUtc`, `geolocation`.
/// Every value is a string: absent optionals become `""` and the
/// geolocation is embedded as its own canonical JSON string.
pub fn canonicalize(metadata: &SignatureMetadata) -> Result<String, EvidenceError> {
    metadata.timestamp()?;

    let geolocation = match &metadata.geolocation {
        Some(geo) => geo.canonical_string()?,
        None => String::new(),
    };

    let canonical = CanonicalMetadata {
        ip: metadata.ip.as_deref().unwrap_or(""),
        user_agent: metadata.user_agent.as_deref().unwrap_or(""),
        fingerprint: metadata.fingerprint.as_deref().unwrap_or(""),
        timestamp_utc: &metadata.timestamp_utc,
        geolocation,
    };

    Ok(serde_json::to_string(&canonical)?)
}
