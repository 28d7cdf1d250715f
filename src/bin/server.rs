use ai_financial_agents::{
    agent::cfo::CfoAgent,
    api::{start_server, AppState},
    config::Settings,
    data::source_from_settings,
    llm::client_from_settings,
    orchestrator::Orchestrator,
    tools::create_default_hub,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Arc::new(Settings::from_env());

    info!("🚀 AI Financial Agents - API Server");
    info!("📍 Port: {}", settings.port);
    if settings.demo_mode() {
        info!("🧪 Demo mode: no OPENAI_API_KEY set, using deterministic responses");
    }

    // Create components
    let hub = Arc::new(create_default_hub());
    let llm = client_from_settings(&settings);
    let data = source_from_settings(&settings);

    let orchestrator = Arc::new(Orchestrator::new(
        settings.max_concurrent_agents,
        settings.default_agent.clone(),
    ));
    orchestrator
        .register_agent(Arc::new(CfoAgent::new(
            Arc::clone(&hub),
            llm,
            data,
            settings.industry.clone(),
        )))
        .await;

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    start_server(AppState {
        orchestrator,
        hub,
        settings,
    })
    .await?;

    Ok(())
}
