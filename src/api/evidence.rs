use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::EvidenceError;
use crate::evidence::{EvidenceRecord, Geolocation, HashScheme, NewEvidence, RequestType};
use crate::request::metadata_from_headers;

/// Error response wrapper: caller mistakes map to 400, everything else
/// to 500.
pub struct ApiError(EvidenceError);

impl From<EvidenceError> for ApiError {
    fn from(err: EvidenceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Evidence request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SealRequest {
    pub organization_id: Uuid,
    pub request_type: RequestType,
    pub request_id: Uuid,
    pub signer_email: String,
    pub signature_payload: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub geolocation: Option<Geolocation>,
    #[serde(default)]
    pub document_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub record_id: Uuid,
    pub valid: bool,
    pub scheme: HashScheme,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "eduzen-evidence",
        "timestamp": chrono::Utc::now()
    }))
}

/// Seal a signing event. IP, user agent and timestamp come from the
/// request itself, never from the body.
pub async fn seal_evidence(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SealRequest>,
) -> Result<Json<EvidenceRecord>, ApiError> {
    let metadata = metadata_from_headers(
        &headers,
        request.fingerprint,
        request.geolocation,
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    )?;

    let record = EvidenceRecord::seal(
        state.verifier.hasher(),
        NewEvidence {
            organization_id: request.organization_id,
            request_type: request.request_type,
            request_id: request.request_id,
            signer_email: request.signer_email.trim().to_string(),
            signature_payload: request.signature_payload.trim().to_string(),
            metadata,
            document_hash: request.document_hash,
        },
    )?;

    if let Some(log) = &state.log {
        log.append(&record).await?;
    }

    info!(
        "Sealed {} evidence {} for request {}",
        record.request_type.as_str(),
        record.id,
        record.request_id
    );
    Ok(Json(record))
}

pub async fn verify_evidence(
    State(state): State<AppState>,
    Json(record): Json<EvidenceRecord>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let matched = state.verifier.match_record(&record)?;
    if matched.is_none() {
        warn!("Integrity check failed for evidence record {}", record.id);
    }
    Ok(Json(VerifyResponse {
        record_id: record.id,
        valid: matched.is_some(),
        scheme: matched.unwrap_or(record.scheme),
    }))
}
