use distributed_calculator::calculator::handlers::router;
use distributed_calculator::calculator::scheduler::Scheduler;
use distributed_calculator::config::{OrchestratorConfig, load_dotenv};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = OrchestratorConfig::from_env();
    tracing::info!("Operation timings: {:?}", config.timings);

    // 1. Shared state:
    let scheduler = Arc::new(Scheduler::new(config.timings, config.task_lease_ms));

    // 2. Spawn lease reaper:
    if config.task_lease_ms > 0 {
        tracing::info!("Task lease: {} ms", config.task_lease_ms);
        let reaper = scheduler.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let requeued = reaper.requeue_expired();
                if requeued > 0 {
                    tracing::info!("Requeued {} tasks with expired leases", requeued);
                }
            }
        });
    } else {
        tracing::warn!("Task leasing disabled, lost tasks will stall their expressions");
    }

    // 3. Spawn stats reporter:
    let stats = scheduler.clone();
    let stats_interval = Duration::from_secs(config.stats_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(stats_interval);
        loop {
            interval.tick().await;
            let counts = stats.status_counts();
            tracing::info!(
                "Expressions: pending={} processing={} completed={} failed={} | queued={} leased={}",
                counts.pending,
                counts.processing,
                counts.completed,
                counts.failed,
                counts.queued,
                counts.leased
            );
        }
    });

    // 4. Start HTTP server:
    let app = router(scheduler);
    let addr = config.bind_addr();

    tracing::info!("Orchestrator listening on {}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
