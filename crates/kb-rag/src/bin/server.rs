//! Knowledge-base server binary
//!
//! Run with: cargo run -p kb-rag --bin kb-rag-server

use kb_rag::{config::KbConfig, server::KbServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kb_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => KbConfig::load(&path)?,
        None => KbConfig::default(),
    };

    tracing::info!("configuration loaded");
    tracing::info!("  - embedding model: {}", config.embeddings.model);
    tracing::info!("  - embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - generation model: {}", config.llm.generate_model);
    tracing::info!("  - chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - storage: {}", config.vector_db.storage_path.display());

    // Warn early if the model server is down; requests will still retry.
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.llm.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running at {}", config.llm.base_url);
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
            tracing::warn!(
                "start it with `ollama serve` and pull models: \
                 ollama pull {} && ollama pull {}",
                config.embeddings.model,
                config.llm.generate_model
            );
        }
    }

    let server = KbServer::new(config)?;
    tracing::info!("API: http://{}", server.address());
    server.start().await?;
    Ok(())
}
