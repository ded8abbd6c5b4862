use desk_analytics::{
    api::{build_router, AppState},
    config::Config,
    filter::{LlmClient, QueryResolver},
    store::TicketStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "desk_analytics=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    tracing::info!("Starting desk-analytics v{}", env!("CARGO_PKG_VERSION"));

    // Load the mock ticket store; the collection is read-only from here on
    let store = Arc::new(TicketStore::with_mock_data()?);
    tracing::info!(tickets = store.len(), "Ticket store initialized");

    // Set up the LLM client; a missing or placeholder key is expected and
    // routes every query to the keyword fallback
    let llm_client = LlmClient::from_env(config.llm.clone())?;
    if llm_client.has_credential() {
        tracing::info!(model = %config.llm.model, "LLM filtering enabled");
    } else {
        tracing::warn!(
            env = %config.llm.api_key_env,
            "No API key configured; queries will use the keyword fallback"
        );
    }

    let resolver = Arc::new(QueryResolver::new(llm_client, &config.llm));

    // Build HTTP router
    let app_state = AppState::new(store, resolver);
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Query API: http://{}/api/query", http_addr);
    tracing::info!("   Mock Jira search: http://{}/rest/api/3/search", http_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
