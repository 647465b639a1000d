//! Evidence Secret Provisioning
//!
//! Loads the server-held sealing secret from process configuration and
//! refuses to hand out a missing or short secret.

use std::env;
use std::fmt;

use tracing::{info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::error::EvidenceError;

/// Minimum accepted secret length, in characters.
pub const MIN_SECRET_LENGTH: usize = 16;

/// Environment variable checked first.
pub const PRIMARY_SECRET_VAR: &str = "SIGNATURE_EVIDENCE_SECRET";

/// Older variable name still honoured when the primary one is unusable.
pub const LEGACY_SECRET_VAR: &str = "SIGNATURE_SECRET";

/// Reject secrets shorter than [`MIN_SECRET_LENGTH`].
pub fn check_secret_strength(secret: &str) -> Result<(), EvidenceError> {
    let length = secret.chars().count();
    if length < MIN_SECRET_LENGTH {
        return Err(EvidenceError::weak_secret(length));
    }
    Ok(())
}

/// Sealing secret. Validated on construction, redacted in `Debug`,
/// wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct EvidenceSecret(String);

impl EvidenceSecret {
    /// A rejected value is wiped before the error is returned.
    pub fn new(value: impl Into<String>) -> Result<Self, EvidenceError> {
        let mut value = value.into();
        if let Err(e) = check_secret_strength(&value) {
            value.zeroize();
            return Err(e);
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EvidenceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EvidenceSecret([REDACTED])")
    }
}

impl Drop for EvidenceSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Read the sealing secret from the process environment.
pub fn get_secret() -> Result<EvidenceSecret, EvidenceError> {
    secret_from_lookup(|name| env::var(name).ok())
}

/// Resolve the secret through `lookup`, trying the primary variable and
/// then the legacy one. A source counts only if it is set and long
/// enough once surrounding whitespace is trimmed.
pub fn secret_from_lookup<F>(lookup: F) -> Result<EvidenceSecret, EvidenceError>
where
    F: Fn(&str) -> Option<String>,
{
    for name in [PRIMARY_SECRET_VAR, LEGACY_SECRET_VAR] {
        let Some(raw) = lookup(name).map(Zeroizing::new) else {
            continue;
        };

        match EvidenceSecret::new(raw.trim()) {
            Ok(secret) => {
                if name == LEGACY_SECRET_VAR {
                    warn!(
                        "Using legacy secret variable {}; rename it to {}",
                        LEGACY_SECRET_VAR, PRIMARY_SECRET_VAR
                    );
                }
                info!("Evidence secret loaded from {}", name);
                return Ok(secret);
            }
            Err(e) => warn!("Ignoring {}: {}", name, e),
        }
    }

    Err(EvidenceError::Configuration(format!(
        "No usable evidence secret: set {} (or legacy {}) to at least {} characters",
        PRIMARY_SECRET_VAR, LEGACY_SECRET_VAR, MIN_SECRET_LENGTH
    )))
}
