//! One-shot demo: route a single message through the orchestrator and
//! print the resulting report. Runs entirely on the fixture data set when
//! no API key is configured.

use ai_financial_agents::{
    agent::cfo::CfoAgent,
    config::Settings,
    data::source_from_settings,
    llm::client_from_settings,
    models::RouteOutcome,
    orchestrator::Orchestrator,
    tools::create_default_hub,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    dotenv::dotenv().ok();
    let settings = Settings::from_env();

    let message = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let message = if message.is_empty() {
        "Analyze my company's financial health".to_string()
    } else {
        message
    };

    let hub = Arc::new(create_default_hub());
    let llm = client_from_settings(&settings);
    let data = source_from_settings(&settings);

    let orchestrator = Orchestrator::new(
        settings.max_concurrent_agents,
        settings.default_agent.clone(),
    );
    orchestrator
        .register_agent(Arc::new(CfoAgent::new(hub, llm, data, settings.industry)))
        .await;

    println!("Request: {}\n", message);

    match orchestrator.route_request(&message, None, None, None).await {
        RouteOutcome::Agent(response) => {
            println!("{}", response.response);
            println!(
                "\n[agent: {}, steps: {}]",
                response.agent_id,
                response.completed_steps.join(", ")
            );
        }
        RouteOutcome::Workflow(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        RouteOutcome::Failure { error, .. } => {
            eprintln!("Routing failed: {}", error);
            std::process::exit(1);
        }
    }

    Ok(())
}
