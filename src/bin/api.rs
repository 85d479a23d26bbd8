use savings_planner::{
    agent::PlanningAgent,
    api::start_server,
    config::AppConfig,
    extraction::AnnualFigureExtractor,
    planner::OpenRouterPlanner,
    verification::create_default_validator,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("Savings Planner - API Server");
    info!(port = config.port, mode = %config.mode, model = %config.llm.model, "Configuration loaded");

    if config.llm.api_key.is_empty() {
        warn!("OPENROUTER_API_KEY not set - serving deterministic fallback plans only");
    }

    let planner = Box::new(OpenRouterPlanner::new(config.llm.clone())?);
    let agent = Arc::new(PlanningAgent::new(
        planner,
        Box::new(AnnualFigureExtractor),
        create_default_validator(),
        config.policy,
        config.mode,
    ));

    info!("Planning agent initialized");

    start_server(agent, config.port).await?;

    Ok(())
}
