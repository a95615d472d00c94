//! HTTP client for the orchestrator's internal task endpoint.

use crate::calculator::protocol::{
    ENDPOINT_INTERNAL_TASK, TaskPayload, TaskResponse, TaskResultRequest,
};
use crate::calculator::types::TaskId;

use anyhow::Result;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct OrchestratorClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl OrchestratorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: reqwest::Client::new(),
        }
    }

    fn task_url(&self) -> String {
        format!("{}{}", self.base_url, ENDPOINT_INTERNAL_TASK)
    }

    /// Asks for the next runnable task. `None` means the queue is empty.
    pub async fn fetch_task(&self) -> Result<Option<TaskPayload>> {
        let url = self.task_url();
        let response = self
            .send_with_retry(|http| http.get(&url), REQUEST_TIMEOUT, ATTEMPTS)
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "failed to fetch task, status: {}",
                response.status()
            ));
        }

        let body: TaskResponse = response.json().await?;
        Ok(Some(body.task))
    }

    pub async fn send_result(&self, task_id: &TaskId, result: f64) -> Result<()> {
        self.send_outcome(&TaskResultRequest {
            id: task_id.clone(),
            result: Some(result),
            error: None,
        })
        .await
    }

    pub async fn send_failure(&self, task_id: &TaskId, error: &str) -> Result<()> {
        self.send_outcome(&TaskResultRequest {
            id: task_id.clone(),
            result: None,
            error: Some(error.to_string()),
        })
        .await
    }

    async fn send_outcome(&self, outcome: &TaskResultRequest) -> Result<()> {
        let url = self.task_url();
        let response = self
            .send_with_retry(|http| http.post(&url).json(outcome), REQUEST_TIMEOUT, ATTEMPTS)
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "failed to send outcome, status: {}, body: {}",
                status,
                body
            ));
        }

        Ok(())
    }

    // --- HTTP Helper with Backoff ---

    /// Sends the request built by `build`, retrying transport errors with
    /// exponential backoff plus jitter. Any HTTP response counts as delivered.
    async fn send_with_retry(
        &self,
        build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
        timeout: Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match build(&self.http_client).timeout(timeout).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt >= attempts => return Err(anyhow::anyhow!(e)),
                Err(e) => {
                    tracing::debug!("Request attempt {} failed: {}", attempt, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }
    }
}
