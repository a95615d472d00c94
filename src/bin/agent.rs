use distributed_calculator::agent::worker::Agent;
use distributed_calculator::config::{AgentConfig, load_dotenv};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AgentConfig::from_env()?;
    tracing::info!(
        "Agent connecting to {} with {} workers",
        config.orchestrator_url,
        config.computing_power
    );

    let workers = Agent::new(&config).start().await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down {} workers", workers.len());
    for worker in workers {
        worker.abort();
    }

    Ok(())
}
