use std::net::SocketAddr;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EvidenceError;
use crate::evidence::{EvidenceHasher, EvidenceVerifier, HashScheme};
use crate::secret::EvidenceSecret;

/// Prefix for environment overrides, e.g. `EVIDENCE_SERVER_PORT`.
pub const ENV_PREFIX: &str = "EVIDENCE";

/// Settings file looked up next to the binary when present.
pub const DEFAULT_CONFIG_FILE: &str = "evidence";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    /// Scheme used for newly sealed records.
    pub scheme: HashScheme,
    /// Accept records sealed with the legacy scheme during verification.
    pub accept_legacy: bool,
    /// JSONL evidence log; sealed records are not persisted when unset.
    #[serde(default)]
    pub log_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, EvidenceError> {
        Self::load_from_file(Some(DEFAULT_CONFIG_FILE))
    }

    /// Defaults, then the optional settings file, then `EVIDENCE_*`
    /// environment variables.
    pub fn load_from_file(path: Option<&str>) -> Result<Self, EvidenceError> {
        let mut builder = Config::builder()
            .set_default("server_host", "0.0.0.0")
            .and_then(|b| b.set_default("server_port", 3000))
            .and_then(|b| b.set_default("scheme", HashScheme::default().as_str()))
            .and_then(|b| b.set_default("accept_legacy", false))
            .map_err(config_error)?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: AppConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        info!(
            scheme = config.scheme.as_str(),
            accept_legacy = config.accept_legacy,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, EvidenceError> {
        format!("{}:{}", self.server_host, self.server_port)
            .parse()
            .map_err(|e| {
                EvidenceError::Configuration(format!(
                    "Invalid bind address {}:{}: {}",
                    self.server_host, self.server_port, e
                ))
            })
    }

    /// Verifier using this configuration's scheme and legacy policy.
    pub fn verifier(&self, secret: EvidenceSecret) -> EvidenceVerifier {
        EvidenceVerifier::new(EvidenceHasher::new(secret).with_scheme(self.scheme))
            .accept_legacy(self.accept_legacy)
    }
}

fn config_error(err: config::ConfigError) -> EvidenceError {
    EvidenceError::Configuration(err.to_string())
}
