//! Evidence Record
//!
//! One sealed signing or attendance event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EvidenceError;
use crate::evidence::hasher::{is_hex_digest, EvidenceHasher, HashScheme};
use crate::evidence::metadata::SignatureMetadata;

/// Kind of request a record proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Single-signer document signature request.
    Signature,
    /// Electronic attendance sheet entry.
    Attendance,
    /// One step of a multi-signer signing process.
    Process,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Signature => "signature",
            RequestType::Attendance => "attendance",
            RequestType::Process => "process",
        }
    }
}

impl std::str::FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signature" => Ok(RequestType::Signature),
            "attendance" => Ok(RequestType::Attendance),
            "process" => Ok(RequestType::Process),
            _ => Err(format!("Unknown request type: {}", s)),
        }
    }
}

/// Inputs for sealing a new record.
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub organization_id: Uuid,
    pub request_type: RequestType,
    pub request_id: Uuid,
    pub signer_email: String,
    pub signature_payload: String,
    pub metadata: SignatureMetadata,
    pub document_hash: Option<String>,
}

/// Sealed evidence of one signing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub request_type: RequestType,
    pub request_id: Uuid,
    pub signer_email: String,
    #[serde(alias = "signature_data")]
    pub signature_payload: String,
    pub metadata: SignatureMetadata,
    pub integrity_hash: String,
    #[serde(default)]
    pub scheme: HashScheme,
    /// SHA-256 of the sealed PDF, when the event produced one. Not an
    /// input to `integrity_hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EvidenceRecord {
    /// Hash `evidence` with `hasher` and build the record.
    pub fn seal(hasher: &EvidenceHasher, evidence: NewEvidence) -> Result<Self, EvidenceError> {
        if let Some(document_hash) = &evidence.document_hash {
            if !is_hex_digest(document_hash) {
                return Err(EvidenceError::InvalidInput(format!(
                    "document_hash is not a SHA-256 hex digest: {}",
                    document_hash
                )));
            }
        }

        let integrity_hash = hasher.compute(
            &evidence.signer_email,
            &evidence.signature_payload,
            &evidence.metadata,
        )?;

        Ok(Self {
            id: Uuid::new_v4(),
            organization_id: evidence.organization_id,
            request_type: evidence.request_type,
            request_id: evidence.request_id,
            signer_email: evidence.signer_email,
            signature_payload: evidence.signature_payload,
            metadata: evidence.metadata,
            integrity_hash,
            scheme: hasher.scheme(),
            document_hash: evidence.document_hash.map(|h| h.to_ascii_lowercase()),
            created_at: Utc::now(),
        })
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} {} by {} ({})",
            self.request_type.as_str(),
            self.request_id,
            self.signer_email,
            self.integrity_hash
        )
    }
}
