//! Evidence Log
//!
//! Append-only JSONL store of sealed evidence records. Records that do
//! not verify are refused at append time.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::EvidenceError;
use crate::evidence::record::EvidenceRecord;
use crate::evidence::verify::EvidenceVerifier;

/// Evidence log backed by a JSONL file
#[derive(Clone)]
pub struct EvidenceLog {
    log_path: String,
    file: Arc<Mutex<File>>,
    verifier: EvidenceVerifier,
}

impl EvidenceLog {
    /// Open (or create) the log at `log_path`.
    pub fn open(log_path: impl Into<String>, verifier: EvidenceVerifier) -> Result<Self, EvidenceError> {
        let log_path = log_path.into();
        if let Some(parent) = Path::new(&log_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        info!("Evidence log opened at {}", log_path);
        Ok(Self {
            log_path,
            file: Arc::new(Mutex::new(file)),
            verifier,
        })
    }

    pub fn path(&self) -> &str {
        &self.log_path
    }

    /// Append a record after checking its integrity hash.
    pub async fn append(&self, record: &EvidenceRecord) -> Result<(), EvidenceError> {
        if !self.verifier.check_record(record)? {
            return Err(EvidenceError::Integrity(format!(
                "record {} does not match its integrity hash",
                record.id
            )));
        }

        let json = serde_json::to_string(record)?;
        let mut file = self.file.lock().await;
        writeln!(file, "{}", json)?;
        file.flush()?;

        debug!("Appended evidence record {}", record.id);
        Ok(())
    }

    /// Load every record in the log.
    pub async fn load_all(&self) -> Result<Vec<EvidenceRecord>, EvidenceError> {
        let _guard = self.file.lock().await;
        load_records_from_file(&self.log_path)
    }
}

/// Read records from a JSONL file, skipping blank lines.
pub fn load_records_from_file(path: &str) -> Result<Vec<EvidenceRecord>, EvidenceError> {
    let file = File::open(path)
        .map_err(|e| EvidenceError::Io(format!("Failed to open evidence log {}: {}", path, e)))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EvidenceRecord = serde_json::from_str(&line).map_err(|e| {
            EvidenceError::Serialization(format!(
                "Failed to parse record at line {}: {}",
                line_num + 1,
                e
            ))
        })?;
        records.push(record);
    }

    debug!("Loaded {} evidence records from {}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::hasher::EvidenceHasher;
    use crate::evidence::metadata::SignatureMetadata;
    use crate::evidence::record::{NewEvidence, RequestType};
    use crate::secret::EvidenceSecret;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn verifier() -> EvidenceVerifier {
        EvidenceVerifier::new(EvidenceHasher::new(
            EvidenceSecret::new("a-very-long-secret-key-1234").unwrap(),
        ))
    }

    fn record(verifier: &EvidenceVerifier) -> EvidenceRecord {
        EvidenceRecord::seal(
            verifier.hasher(),
            NewEvidence {
                organization_id: Uuid::new_v4(),
                request_type: RequestType::Process,
                request_id: Uuid::new_v4(),
                signer_email: "signer@example.com".to_string(),
                signature_payload: "data:image/png;base64,AAA".to_string(),
                metadata: SignatureMetadata::new("2024-01-01T00:00:00Z"),
                document_hash: None,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/evidence.jsonl");
        let verifier = verifier();
        let log = EvidenceLog::open(path.to_string_lossy(), verifier.clone()).unwrap();

        let first = record(&verifier);
        let second = record(&verifier);
        log.append(&first).await.unwrap();
        log.append(&second).await.unwrap();

        let loaded = log.load_all().await.unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[tokio::test]
    async fn test_append_refuses_tampered_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("evidence.jsonl");
        let verifier = verifier();
        let log = EvidenceLog::open(path.to_string_lossy(), verifier.clone()).unwrap();

        let mut tampered = record(&verifier);
        tampered.signature_payload = "data:image/png;base64,BBB".to_string();
        let err = log.append(&tampered).await.unwrap_err();
        assert!(matches!(err, EvidenceError::Integrity(_)));
        assert!(!err.is_client_error());
        assert!(log.load_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_load_reports_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("evidence.jsonl");
        std::fs::write(&path, "\n{not json}\n").unwrap();

        let err = load_records_from_file(&path.to_string_lossy()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_records_from_file("/nonexistent/evidence.jsonl"),
            Err(EvidenceError::Io(_))
        ));
    }
}
