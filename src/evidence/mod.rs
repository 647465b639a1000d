//! Signature Evidence
//!
//! Tamper-evident sealing of signature and attendance events: metadata
//! canonicalization, keyed hashing, verification and the evidence log.

pub mod document;
pub mod hasher;
pub mod log;
pub mod metadata;
pub mod record;
pub mod verify;

pub use document::{hash_document, verify_document};
pub use hasher::{
    compute_integrity_hash, compute_integrity_hash_with, normalize_email, EvidenceHasher,
    HashScheme,
};
pub use log::{load_records_from_file, EvidenceLog};
pub use metadata::{canonicalize, Geolocation, SignatureMetadata};
pub use record::{EvidenceRecord, NewEvidence, RequestType};
pub use verify::{
    verify_integrity_hash, verify_integrity_hash_with, AuditReport, EvidenceVerifier,
    RecordVerification,
};
