//! HTTP surface for sealing and verifying evidence.

pub mod evidence;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::evidence::{EvidenceLog, EvidenceVerifier};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<EvidenceVerifier>,
    pub log: Option<EvidenceLog>,
}

impl AppState {
    pub fn new(verifier: EvidenceVerifier, log: Option<EvidenceLog>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            log,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(evidence::health_check))
        .route("/evidence/seal", post(evidence::seal_evidence))
        .route("/evidence/verify", post(evidence::verify_evidence))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}
