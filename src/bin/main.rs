use savings_planner::{
    agent::PlanningAgent,
    config::{PipelineMode, PlanningPolicy},
    extraction::AnnualFigureExtractor,
    planner::MockPlanner,
    verification::create_default_validator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE_MESSAGE: &str =
    "I earn 1200000 per annum, spend 600000 per annum and want a safe plan for a house";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let message = if args.is_empty() {
        SAMPLE_MESSAGE.to_string()
    } else {
        args.join(" ")
    };

    let agent = PlanningAgent::new(
        Box::new(MockPlanner::default()),
        Box::new(AnnualFigureExtractor),
        create_default_validator(),
        PlanningPolicy::default(),
        PipelineMode::FallbackOnly,
    );

    info!(message = %message, "Planning offline");

    match agent.plan(&message).await {
        Ok(response) => {
            println!("{}", response.to_pretty_json()?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Planning failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
