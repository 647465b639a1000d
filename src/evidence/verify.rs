//! Evidence Verification
//!
//! Recomputes integrity hashes from stored inputs and compares them in
//! constant time. A mismatch is a normal `false` result, never an error.

use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EvidenceError;
use crate::evidence::hasher::{
    compute_integrity_hash_with, is_hex_digest, EvidenceHasher, HashScheme,
};
use crate::evidence::metadata::SignatureMetadata;
use crate::evidence::record::EvidenceRecord;

/// Constant-time comparison of a computed digest with a stored one.
/// Stored values that are not exactly 64 hex characters never match.
pub fn digests_match(computed: &str, expected: &str) -> bool {
    if !is_hex_digest(expected) {
        return false;
    }
    let expected = expected.to_ascii_lowercase();
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Verify a stored hash with the default scheme.
pub fn verify_integrity_hash(
    signer_email: &str,
    signature_payload: &str,
    metadata: &SignatureMetadata,
    secret: &str,
    expected_hash: &str,
) -> Result<bool, EvidenceError> {
    verify_integrity_hash_with(
        HashScheme::default(),
        signer_email,
        signature_payload,
        metadata,
        secret,
        expected_hash,
    )
}

pub fn verify_integrity_hash_with(
    scheme: HashScheme,
    signer_email: &str,
    signature_payload: &str,
    metadata: &SignatureMetadata,
    secret: &str,
    expected_hash: &str,
) -> Result<bool, EvidenceError> {
    let computed =
        compute_integrity_hash_with(scheme, signer_email, signature_payload, metadata, secret)?;
    Ok(digests_match(&computed, expected_hash))
}

/// Verifier bound to an injected hasher.
#[derive(Debug, Clone)]
pub struct EvidenceVerifier {
    hasher: EvidenceHasher,
    accept_legacy: bool,
}

impl EvidenceVerifier {
    pub fn new(hasher: EvidenceHasher) -> Self {
        Self {
            hasher,
            accept_legacy: false,
        }
    }

    /// Also accept digests produced by the legacy concatenation scheme.
    pub fn accept_legacy(mut self, accept: bool) -> Self {
        self.accept_legacy = accept;
        self
    }

    pub fn accepts_legacy(&self) -> bool {
        self.accept_legacy
    }

    pub fn hasher(&self) -> &EvidenceHasher {
        &self.hasher
    }

    /// Check raw inputs against `expected_hash`, trying the hasher's
    /// scheme first and then the legacy one if accepted. Returns the
    /// scheme that matched.
    pub fn verify(
        &self,
        signer_email: &str,
        signature_payload: &str,
        metadata: &SignatureMetadata,
        expected_hash: &str,
    ) -> Result<Option<HashScheme>, EvidenceError> {
        let primary = self.hasher.scheme();
        let computed = self
            .hasher
            .compute_with(primary, signer_email, signature_payload, metadata)?;
        if digests_match(&computed, expected_hash) {
            return Ok(Some(primary));
        }

        if self.accept_legacy && primary != HashScheme::LegacySha256 {
            let legacy = self.hasher.compute_with(
                HashScheme::LegacySha256,
                signer_email,
                signature_payload,
                metadata,
            )?;
            if digests_match(&legacy, expected_hash) {
                warn!("Evidence matched only the legacy hash scheme");
                return Ok(Some(HashScheme::LegacySha256));
            }
        }

        Ok(None)
    }

    /// The hasher's own scheme and HMAC are always accepted; the legacy
    /// scheme only when it is the hasher's scheme or `accept_legacy` is set.
    fn scheme_accepted(&self, scheme: HashScheme) -> bool {
        scheme == self.hasher.scheme() || scheme == HashScheme::HmacSha256 || self.accept_legacy
    }

    /// Check a record, starting with the scheme it claims to be sealed
    /// with. Rows without a recorded scheme deserialize as HMAC, so with
    /// `accept_legacy` a failed check is retried under the legacy scheme.
    /// Returns the scheme that matched.
    pub fn match_record(
        &self,
        record: &EvidenceRecord,
    ) -> Result<Option<HashScheme>, EvidenceError> {
        if self.scheme_accepted(record.scheme) {
            let computed = self.hasher.compute_with(
                record.scheme,
                &record.signer_email,
                &record.signature_payload,
                &record.metadata,
            )?;
            if digests_match(&computed, &record.integrity_hash) {
                return Ok(Some(record.scheme));
            }
        } else {
            debug!("Record {} uses the legacy scheme, which is not accepted", record.id);
        }

        if self.accept_legacy && record.scheme != HashScheme::LegacySha256 {
            let legacy = self.hasher.compute_with(
                HashScheme::LegacySha256,
                &record.signer_email,
                &record.signature_payload,
                &record.metadata,
            )?;
            if digests_match(&legacy, &record.integrity_hash) {
                warn!("Record {} matched only the legacy hash scheme", record.id);
                return Ok(Some(HashScheme::LegacySha256));
            }
        }

        Ok(None)
    }

    pub fn check_record(&self, record: &EvidenceRecord) -> Result<bool, EvidenceError> {
        Ok(self.match_record(record)?.is_some())
    }

    /// Check a record and report the outcome without failing.
    pub fn verify_record(&self, record: &EvidenceRecord) -> RecordVerification {
        match self.match_record(record) {
            Ok(Some(scheme)) => RecordVerification {
                record_id: record.id,
                is_valid: true,
                scheme,
                error_message: None,
            },
            Ok(None) => {
                warn!("Integrity check failed for evidence record {}", record.id);
                RecordVerification {
                    record_id: record.id,
                    is_valid: false,
                    scheme: record.scheme,
                    error_message: Some("integrity hash mismatch".to_string()),
                }
            }
            Err(e) => RecordVerification {
                record_id: record.id,
                is_valid: false,
                scheme: record.scheme,
                error_message: Some(e.to_string()),
            },
        }
    }

    /// Indices of records that fail verification for any reason.
    pub fn find_tampered_records(&self, records: &[EvidenceRecord]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| !self.verify_record(record).is_valid)
            .map(|(i, _)| i)
            .collect()
    }

    /// Verify a batch of records.
    pub fn audit_records(&self, records: &[EvidenceRecord]) -> AuditReport {
        let results: Vec<RecordVerification> =
            records.iter().map(|r| self.verify_record(r)).collect();
        let valid = results.iter().filter(|r| r.is_valid).count();
        let failed = results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_valid)
            .map(|(i, _)| i)
            .collect();

        info!(
            "Evidence audit complete: {} of {} records valid",
            valid,
            records.len()
        );

        AuditReport {
            total: records.len(),
            valid,
            failed,
            results,
        }
    }
}

/// Outcome of verifying one record.
#[derive(Debug, Clone)]
pub struct RecordVerification {
    pub record_id: Uuid,
    pub is_valid: bool,
    pub scheme: HashScheme,
    pub error_message: Option<String>,
}

impl RecordVerification {
    pub fn summary(&self) -> String {
        if self.is_valid {
            format!("✅ {} valid ({})", self.record_id, self.scheme)
        } else {
            format!(
                "❌ {} integrity check failed: {}",
                self.record_id,
                self.error_message.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// Outcome of verifying a batch of records.
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub total: usize,
    pub valid: usize,
    /// Indices of records that did not verify.
    pub failed: Vec<usize>,
    pub results: Vec<RecordVerification>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            format!("✅ All {} evidence records verified", self.total)
        } else {
            format!(
                "❌ {} of {} evidence records failed verification",
                self.failed.len(),
                self.total
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::hasher::compute_integrity_hash;
    use crate::evidence::record::{NewEvidence, RequestType};
    use crate::secret::EvidenceSecret;

    const SECRET: &str = "a-very-long-secret-key-1234";
    const PAYLOAD: &str = "data:image/png;base64,AAA";

    fn meta() -> SignatureMetadata {
        SignatureMetadata::new("2024-01-01T00:00:00Z")
    }

    fn verifier() -> EvidenceVerifier {
        EvidenceVerifier::new(EvidenceHasher::new(EvidenceSecret::new(SECRET).unwrap()))
    }

    fn record() -> EvidenceRecord {
        EvidenceRecord::seal(
            verifier().hasher(),
            NewEvidence {
                organization_id: Uuid::new_v4(),
                request_type: RequestType::Signature,
                request_id: Uuid::new_v4(),
                signer_email: "jane@example.com".to_string(),
                signature_payload: PAYLOAD.to_string(),
                metadata: meta(),
                document_hash: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let hash = compute_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET).unwrap();
        assert!(verify_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET, &hash).unwrap());
    }

    #[test]
    fn test_tampered_payload_is_false_not_error() {
        let hash = compute_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET).unwrap();
        let result =
            verify_integrity_hash("a@b.fr", "data:image/png;base64,AAB", &meta(), SECRET, &hash);
        assert_eq!(result, Ok(false));
    }

    #[test]
    fn test_uppercase_stored_hash_accepted() {
        let hash = compute_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET).unwrap();
        let upper = hash.to_ascii_uppercase();
        assert!(verify_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET, &upper).unwrap());
    }

    #[test]
    fn test_malformed_stored_hash_is_false() {
        assert_eq!(
            verify_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET, "abc"),
            Ok(false)
        );
        assert_eq!(
            verify_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET, ""),
            Ok(false)
        );
    }

    #[test]
    fn test_input_errors_surface() {
        assert!(matches!(
            verify_integrity_hash("a@b.fr", PAYLOAD, &meta(), "short", &"0".repeat(64)),
            Err(EvidenceError::WeakSecret { .. })
        ));
        assert!(matches!(
            verify_integrity_hash("", PAYLOAD, &meta(), SECRET, &"0".repeat(64)),
            Err(EvidenceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_legacy_fallback() {
        let legacy = compute_integrity_hash_with(
            HashScheme::LegacySha256,
            "a@b.fr",
            PAYLOAD,
            &meta(),
            SECRET,
        )
        .unwrap();

        assert_eq!(verifier().verify("a@b.fr", PAYLOAD, &meta(), &legacy), Ok(None));
        assert_eq!(
            verifier()
                .accept_legacy(true)
                .verify("a@b.fr", PAYLOAD, &meta(), &legacy),
            Ok(Some(HashScheme::LegacySha256))
        );
    }

    #[test]
    fn test_verify_record() {
        let record = record();
        let result = verifier().verify_record(&record);
        assert!(result.is_valid);
        assert!(result.summary().contains("✅"));

        let mut tampered = record.clone();
        tampered.metadata.ip = Some("203.0.113.9".to_string());
        let result = verifier().verify_record(&tampered);
        assert!(!result.is_valid);
        assert_eq!(result.error_message.as_deref(), Some("integrity hash mismatch"));
    }

    #[test]
    fn test_verify_record_never_rewrites_hash() {
        let mut record = record();
        record.signature_payload.push('A');
        let before = record.integrity_hash.clone();
        let _ = verifier().verify_record(&record);
        assert_eq!(record.integrity_hash, before);
    }

    #[test]
    fn test_legacy_record_requires_opt_in() {
        let mut record = record();
        record.scheme = HashScheme::LegacySha256;
        record.integrity_hash = compute_integrity_hash_with(
            HashScheme::LegacySha256,
            &record.signer_email,
            &record.signature_payload,
            &record.metadata,
            SECRET,
        )
        .unwrap();

        assert!(!verifier().verify_record(&record).is_valid);
        assert!(verifier().accept_legacy(true).verify_record(&record).is_valid);
    }

    #[test]
    fn test_find_tampered_records() {
        let mut records = vec![record(), record(), record()];
        records[1].signer_email = "mallory@example.com".to_string();
        records[2].metadata.timestamp_utc = String::new();

        let tampered = verifier().find_tampered_records(&records);
        assert_eq!(tampered, vec![1, 2]);

        let report = verifier().audit_records(&records);
        assert_eq!(report.total, 3);
        assert_eq!(report.valid, 1);
        assert!(!report.is_clean());
        assert!(report.results[2]
            .error_message
            .as_deref()
            .unwrap()
            .contains("timestamp_utc"));
    }

    #[test]
    fn test_padded_stored_hash_is_false() {
        let hash = compute_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET).unwrap();
        let padded = format!(" {}\n", hash);
        assert_eq!(
            verify_integrity_hash("a@b.fr", PAYLOAD, &meta(), SECRET, &padded),
            Ok(false)
        );
    }

    #[test]
    fn test_legacy_hasher_verifies_its_own_records() {
        let verifier = EvidenceVerifier::new(
            EvidenceHasher::new(EvidenceSecret::new(SECRET).unwrap())
                .with_scheme(HashScheme::LegacySha256),
        );
        assert!(!verifier.accepts_legacy());

        let record = EvidenceRecord::seal(
            verifier.hasher(),
            NewEvidence {
                organization_id: Uuid::new_v4(),
                request_type: RequestType::Attendance,
                request_id: Uuid::new_v4(),
                signer_email: "jane@example.com".to_string(),
                signature_payload: PAYLOAD.to_string(),
                metadata: meta(),
                document_hash: None,
            },
        )
        .unwrap();
        assert_eq!(record.scheme, HashScheme::LegacySha256);
        assert_eq!(verifier.check_record(&record), Ok(true));

        let result = verifier.verify_record(&record);
        assert!(result.is_valid);
        assert_eq!(result.scheme, HashScheme::LegacySha256);
    }

    #[test]
    fn test_imported_row_without_scheme_falls_back_to_legacy() {
        let metadata = meta().with_ip("203.0.113.7");
        let legacy_hash = compute_integrity_hash_with(
            HashScheme::LegacySha256,
            "jane@example.com",
            PAYLOAD,
            &metadata,
            SECRET,
        )
        .unwrap();

        let row = serde_json::json!({
            "id": Uuid::new_v4(),
            "organization_id": Uuid::new_v4(),
            "request_type": "signature",
            "request_id": Uuid::new_v4(),
            "signer_email": "jane@example.com",
            "signature_data": PAYLOAD,
            "metadata": metadata,
            "integrity_hash": legacy_hash,
            "created_at": "2024-01-01T00:00:00Z"
        });
        let record: EvidenceRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.scheme, HashScheme::HmacSha256);

        assert!(!verifier().verify_record(&record).is_valid);

        let lenient = verifier().accept_legacy(true);
        let result = lenient.verify_record(&record);
        assert!(result.is_valid);
        assert_eq!(result.scheme, HashScheme::LegacySha256);
        assert!(lenient.audit_records(&[record]).is_clean());
    }
}
