use std::sync::Arc;

use anyhow::Result;
use campus_chatbot::{api, build_model_and_tokenizer, AppState, QaStore, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env();
    let qa = QaStore::load(&settings.qa_path);

    // Model load must finish before the listener accepts the first request.
    let runtime = match build_model_and_tokenizer(&settings) {
        Ok(runtime) => Some(runtime),
        Err(e) => {
            tracing::warn!(error = %e, "model load failed, serving in degraded mode");
            None
        }
    };

    let state = Arc::new(AppState::new(runtime, qa, settings.clone()));
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
