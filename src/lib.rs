pub mod api;
pub mod config;
pub mod error;
pub mod evidence;
pub mod request;
pub mod secret;

pub use error::EvidenceError;
pub use evidence::{
    compute_integrity_hash, verify_integrity_hash, EvidenceHasher, EvidenceRecord,
    EvidenceVerifier, Geolocation, HashScheme, SignatureMetadata,
};
pub use secret::{get_secret, EvidenceSecret};
