//! Worker Pool Implementation
//!
//! Spawns `computing_power` background workers that continuously poll the orchestrator
//! for tasks, compute them and report the outcome.
//!
//! ## Responsibilities
//! - **Polling**: fetching the next task, backing off while the queue is empty or unreachable.
//! - **Execution**: computing the operation (including its nominal duration).
//! - **Reporting**: sending the value back, or a failure such as division by zero.

use super::client::OrchestratorClient;
use super::compute::compute;
use crate::calculator::protocol::TaskPayload;
use crate::config::AgentConfig;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay before polling again when the orchestrator has no work.
const IDLE_POLL: Duration = Duration::from_millis(100);

pub struct Agent {
    client: OrchestratorClient,
    worker_count: usize,
    /// Backoff after the orchestrator could not be reached.
    error_backoff: Duration,
}

impl Agent {
    pub fn new(config: &AgentConfig) -> Arc<Self> {
        Self::with_client(
            OrchestratorClient::new(config.orchestrator_url.clone()),
            config.computing_power,
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn with_client(
        client: OrchestratorClient,
        worker_count: usize,
        error_backoff: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            worker_count: worker_count.max(1),
            error_backoff,
        })
    }

    /// Spawns the workers and returns their handles immediately.
    pub async fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting {} agent workers", self.worker_count);

        (0..self.worker_count)
            .map(|worker_id| {
                let agent = self.clone();
                tokio::spawn(async move {
                    agent.worker_loop(worker_id).await;
                })
            })
            .collect()
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::info!("Worker {} started", worker_id);

        loop {
            match self.client.fetch_task().await {
                Ok(Some(task)) => self.process(worker_id, task).await,
                Ok(None) => {
                    tokio::time::sleep(IDLE_POLL).await;
                }
                Err(e) => {
                    tracing::warn!("Worker {} failed to fetch task: {}", worker_id, e);
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    async fn process(&self, worker_id: usize, task: TaskPayload) {
        tracing::debug!(
            "Worker {} computing task {}: {} {:?} {}",
            worker_id,
            task.id,
            task.arg1,
            task.operation,
            task.arg2
        );

        let sent = match compute(&task).await {
            Ok(value) => {
                tracing::info!("Worker {} computed task {} = {}", worker_id, task.id, value);
                self.client.send_result(&task.id, value).await
            }
            Err(e) => {
                tracing::warn!("Worker {} could not compute task {}: {}", worker_id, task.id, e);
                self.client.send_failure(&task.id, &e.to_string()).await
            }
        };

        if let Err(e) = sent {
            tracing::error!("Worker {} failed to report task {}: {}", worker_id, task.id, e);
        }
    }
}
