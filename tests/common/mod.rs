#![allow(dead_code)]

use eduzen_evidence::evidence::{
    EvidenceHasher, EvidenceRecord, EvidenceVerifier, NewEvidence, RequestType,
    SignatureMetadata,
};
use eduzen_evidence::secret::EvidenceSecret;
use uuid::Uuid;

pub const TEST_SECRET: &str = "a-very-long-secret-key-1234";
pub const TEST_PAYLOAD: &str = "data:image/png;base64,AAA";

/// Create a verifier bound to the test secret
pub fn create_test_verifier() -> EvidenceVerifier {
    EvidenceVerifier::new(EvidenceHasher::new(
        EvidenceSecret::new(TEST_SECRET).expect("test secret is long enough"),
    ))
}

pub fn test_metadata() -> SignatureMetadata {
    SignatureMetadata::new("2024-01-01T00:00:00Z")
        .with_ip("203.0.113.7")
        .with_user_agent("Mozilla/5.0 (X11; Linux x86_64)")
        .with_fingerprint("fp-7f3a")
}

/// Seal a record for `email` with the test verifier
pub fn create_test_record(verifier: &EvidenceVerifier, email: &str) -> EvidenceRecord {
    EvidenceRecord::seal(
        verifier.hasher(),
        NewEvidence {
            organization_id: Uuid::new_v4(),
            request_type: RequestType::Signature,
            request_id: Uuid::new_v4(),
            signer_email: email.to_string(),
            signature_payload: TEST_PAYLOAD.to_string(),
            metadata: test_metadata(),
            document_hash: None,
        },
    )
    .expect("Failed to seal test record")
}
