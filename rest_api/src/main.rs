// rest_api/src/main.rs

// Entry point for the triage REST API server: loads configuration from the
// environment, wires the Ollama classifier into the application state and
// serves until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::info;

use rest_api::{
    load_classifier_config, load_rest_api_config, start_server, AppState, OllamaClassifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let rest_config = load_rest_api_config().context("Failed to load REST API configuration")?;
    let classifier_config =
        load_classifier_config().context("Failed to load classifier configuration")?;
    info!(
        url = %classifier_config.url,
        model = %classifier_config.model,
        "triage classifier configured"
    );

    let classifier = Arc::new(
        OllamaClassifier::new(&classifier_config)
            .context("Failed to construct classifier client")?,
    );
    let state = AppState::new(classifier);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    start_server(rest_config, state, shutdown_rx).await
}
