use budget_manager_agent::{
    agent::Orchestrator,
    api::start_server,
    config::AgentConfig,
    contract::create_default_validator,
    parser::RecordParser,
    provider::OpenRouterClient,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Missing credentials are fatal at startup, not a runtime error
    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    info!("Budget Manager Agent - API Server");
    info!("Port: {}", config.port);
    info!("Model: {}", config.model);

    // Build the provider once and inject it; no import-time globals
    let provider = Box::new(OpenRouterClient::new(&config));

    let orchestrator = Arc::new(Orchestrator::new(
        RecordParser::new(),
        create_default_validator(),
        provider,
    ));

    info!("Orchestrator initialized, starting API server");

    start_server(orchestrator, config.port).await?;

    Ok(())
}
