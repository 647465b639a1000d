//! Evidence Hasher
//!
//! Computes the keyed integrity digest stored with every signing or
//! attendance event.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::EvidenceError;
use crate::evidence::metadata::{canonicalize, SignatureMetadata};
use crate::secret::{check_secret_strength, get_secret, EvidenceSecret};

type HmacSha256 = Hmac<Sha256>;

/// Separator between hash input fields.
pub const FIELD_DELIMITER: &str = "|";

/// Hex length of a SHA-256 digest.
pub const DIGEST_HEX_LENGTH: usize = 64;

/// Digest construction used to seal a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashScheme {
    /// HMAC-SHA-256 keyed with the secret over `email|payload|metadata`.
    #[default]
    HmacSha256,
    /// SHA-256 over `email|payload|metadata|secret`. Only for records
    /// sealed before the switch to HMAC.
    LegacySha256,
}

impl HashScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::HmacSha256 => "hmac-sha256",
            HashScheme::LegacySha256 => "legacy-sha256",
        }
    }
}

impl std::fmt::Display for HashScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmac-sha256" => Ok(HashScheme::HmacSha256),
            "legacy-sha256" => Ok(HashScheme::LegacySha256),
            _ => Err(format!("Unknown hash scheme: {}", s)),
        }
    }
}

/// Trim and lowercase a signer email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// True if `value` looks like a hex SHA-256 digest (either case).
pub fn is_hex_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LENGTH && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Compute the integrity hash with the default scheme.
pub fn compute_integrity_hash(
    signer_email: &str,
    signature_payload: &str,
    metadata: &SignatureMetadata,
    secret: &str,
) -> Result<String, EvidenceError> {
    compute_integrity_hash_with(
        HashScheme::default(),
        signer_email,
        signature_payload,
        metadata,
        secret,
    )
}

/// Compute the integrity hash with an explicit scheme.
///
/// Errors, in check order: weak secret, empty email or payload, invalid
/// metadata.
pub fn compute_integrity_hash_with(
    scheme: HashScheme,
    signer_email: &str,
    signature_payload: &str,
    metadata: &SignatureMetadata,
    secret: &str,
) -> Result<String, EvidenceError> {
    check_secret_strength(secret)?;

    let email = normalize_email(signer_email);
    if email.is_empty() {
        return Err(EvidenceError::missing_field("signer_email"));
    }
    if signature_payload.trim().is_empty() {
        return Err(EvidenceError::missing_field("signature_payload"));
    }

    let canonical_metadata = canonicalize(metadata)?;
    let message = [email.as_str(), signature_payload, canonical_metadata.as_str()]
        .join(FIELD_DELIMITER);

    let digest = match scheme {
        HashScheme::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
                EvidenceError::Configuration(format!("Invalid HMAC key: {}", e))
            })?;
            mac.update(message.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        HashScheme::LegacySha256 => {
            let mut hasher = Sha256::new();
            hasher.update(message.as_bytes());
            hasher.update(FIELD_DELIMITER.as_bytes());
            hasher.update(secret.as_bytes());
            hex::encode(hasher.finalize())
        }
    };

    debug!(
        scheme = scheme.as_str(),
        payload_len = signature_payload.len(),
        "Computed evidence integrity hash"
    );
    Ok(digest)
}

/// Hasher bound to one validated secret and scheme.
#[derive(Debug, Clone)]
pub struct EvidenceHasher {
    secret: EvidenceSecret,
    scheme: HashScheme,
}

impl EvidenceHasher {
    pub fn new(secret: EvidenceSecret) -> Self {
        Self {
            secret,
            scheme: HashScheme::default(),
        }
    }

    /// Build a hasher from the process environment, failing fast when no
    /// usable secret is configured.
    pub fn from_env() -> Result<Self, EvidenceError> {
        Ok(Self::new(get_secret()?))
    }

    pub fn with_scheme(mut self, scheme: HashScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    pub fn compute(
        &self,
        signer_email: &str,
        signature_payload: &str,
        metadata: &SignatureMetadata,
    ) -> Result<String, EvidenceError> {
        self.compute_with(self.scheme, signer_email, signature_payload, metadata)
    }

    pub fn compute_with(
        &self,
        scheme: HashScheme,
        signer_email: &str,
        signature_payload: &str,
        metadata: &SignatureMetadata,
    ) -> Result<String, EvidenceError> {
        compute_integrity_hash_with(
            scheme,
            signer_email,
            signature_payload,
            metadata,
            self.secret.expose(),
        )
    }
}
