use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eduzen_evidence::api::{router, AppState};
use eduzen_evidence::config::AppConfig;
use eduzen_evidence::evidence::EvidenceLog;
use eduzen_evidence::secret::get_secret;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduzen_evidence=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EDUZEN evidence service");

    let config = AppConfig::load()?;

    // Refuse to start without a usable secret
    let secret = get_secret()?;
    let verifier = config.verifier(secret);

    let log = match &config.log_path {
        Some(path) => Some(EvidenceLog::open(path.clone(), verifier.clone())?),
        None => None,
    };

    let app = router(AppState::new(verifier, log));

    let addr: SocketAddr = config.bind_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
