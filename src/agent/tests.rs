//! Agent Module Tests
//!
//! ## Test Scopes
//! - **Compute**: Arithmetic, operand parsing and division by zero.
//! - **Client**: Talking to a real orchestrator router bound on a loopback port.
//! - **Worker pool**: End-to-end reduction of expressions by running agents.

#[cfg(test)]
mod tests {
    use crate::agent::client::OrchestratorClient;
    use crate::agent::compute::{ComputeError, apply, compute};
    use crate::agent::worker::Agent;
    use crate::calculator::handlers::router;
    use crate::calculator::protocol::TaskPayload;
    use crate::calculator::scheduler::Scheduler;
    use crate::calculator::types::*;

    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn payload(arg1: &str, arg2: &str, operation: Operation, operation_time: u64) -> TaskPayload {
        TaskPayload {
            id: TaskId::new(),
            arg1: arg1.to_string(),
            arg2: arg2.to_string(),
            operation,
            operation_time,
        }
    }

    async fn spawn_orchestrator(scheduler: Arc<Scheduler>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(scheduler)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn wait_until_terminal(scheduler: &Scheduler, id: &ExpressionId) -> ExpressionSummary {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let summary = scheduler.get_expression(id).unwrap();
            if summary.status.is_terminal() {
                return summary;
            }
            assert!(Instant::now() < deadline, "expression {} never finished", id);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    // ============================================================
    // COMPUTE TESTS
    // ============================================================

    #[test]
    fn test_apply_operations() {
        assert_eq!(apply(Operation::Addition, 2.0, 3.0), Ok(5.0));
        assert_eq!(apply(Operation::Subtraction, 2.0, 3.0), Ok(-1.0));
        assert_eq!(apply(Operation::Multiplication, 2.0, 3.0), Ok(6.0));
        assert_eq!(apply(Operation::Division, 3.0, 2.0), Ok(1.5));
        assert_eq!(apply(Operation::Division, 3.0, 0.0), Err(ComputeError::DivisionByZero));
    }

    #[test]
    fn test_apply_rejects_overflow() {
        assert_eq!(
            apply(Operation::Multiplication, 1e200, 1e200),
            Err(ComputeError::NonFiniteResult)
        );
        assert_eq!(
            apply(Operation::Division, f64::MAX, 0.5),
            Err(ComputeError::NonFiniteResult)
        );
    }

    #[tokio::test]
    async fn test_compute_reads_full_precision_operands() {
        let third = Operand::Literal(1.0 / 3.0).to_string();
        let task = payload(&third, "3.000000", Operation::Multiplication, 0);

        assert_eq!(compute(&task).await, Ok(1.0 / 3.0 * 3.0));
    }

    #[tokio::test]
    async fn test_compute_parses_fixed_point_operands() {
        let task = payload("3.000000", "3", Operation::Multiplication, 0);
        assert_eq!(compute(&task).await, Ok(9.0));
    }

    #[tokio::test]
    async fn test_compute_rejects_bad_operands() {
        let task = payload("T0", "3.000000", Operation::Addition, 0);
        assert_eq!(
            compute(&task).await,
            Err(ComputeError::InvalidOperand("T0".to_string()))
        );
    }

    #[tokio::test]
    async fn test_compute_division_by_zero_skips_the_wait() {
        let task = payload("4.000000", "0.000000", Operation::Division, 60_000);

        let result = tokio::time::timeout(Duration::from_secs(1), compute(&task)).await;
        assert_eq!(result.unwrap(), Err(ComputeError::DivisionByZero));
    }

    #[tokio::test]
    async fn test_compute_honours_operation_time() {
        let task = payload("1", "1", Operation::Addition, 50);

        let started = Instant::now();
        assert_eq!(compute(&task).await, Ok(2.0));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    // ============================================================
    // CLIENT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_client_fetches_and_reports() {
        let scheduler = Arc::new(Scheduler::new(OperationTimings::instant(), 0));
        let client = OrchestratorClient::new(spawn_orchestrator(scheduler.clone()).await);

        assert!(client.fetch_task().await.unwrap().is_none());

        let id = scheduler.submit("6 / 3").unwrap();
        let task = client.fetch_task().await.unwrap().unwrap();
        assert_eq!(task.arg1, "6.000000");
        assert_eq!(task.arg2, "3.000000");
        assert_eq!(task.operation, Operation::Division);

        client.send_result(&task.id, 2.0).await.unwrap();
        assert_eq!(scheduler.get_expression(&id).unwrap().result, Some(2.0));

        // A second report for the same task is out of turn.
        let err = client.send_result(&task.id, 2.0).await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_client_reports_unknown_task() {
        let scheduler = Arc::new(Scheduler::new(OperationTimings::instant(), 0));
        let client = OrchestratorClient::new(spawn_orchestrator(scheduler).await);

        let err = client.send_failure(&TaskId::new(), "boom").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_client_unreachable_orchestrator() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OrchestratorClient::new(format!("http://{}", addr));
        assert!(client.fetch_task().await.is_err());
    }

    // ============================================================
    // WORKER POOL (END TO END)
    // ============================================================

    #[tokio::test]
    async fn test_agents_reduce_expressions() {
        let scheduler = Arc::new(Scheduler::new(OperationTimings::instant(), 0));
        let url = spawn_orchestrator(scheduler.clone()).await;

        let workers = Agent::with_client(OrchestratorClient::new(url), 3, Duration::from_millis(50))
            .start()
            .await;
        assert_eq!(workers.len(), 3);

        let product = scheduler.submit("(1 + 2) * 3").unwrap();
        let mixed = scheduler.submit("(1 + 2) * (3 + 4) - 10 / 4").unwrap();
        let literal = scheduler.submit("5").unwrap();

        let summary = wait_until_terminal(&scheduler, &product).await;
        assert_eq!(summary.status, ExpressionStatus::Completed);
        assert_eq!(summary.result, Some(9.0));

        let summary = wait_until_terminal(&scheduler, &mixed).await;
        assert_eq!(summary.status, ExpressionStatus::Completed);
        assert_eq!(summary.result, Some(18.5));

        assert_eq!(scheduler.get_expression(&literal).unwrap().result, Some(5.0));

        for worker in workers {
            worker.abort();
        }
    }

    #[tokio::test]
    async fn test_agents_report_division_by_zero() {
        let scheduler = Arc::new(Scheduler::new(OperationTimings::instant(), 0));
        let url = spawn_orchestrator(scheduler.clone()).await;

        let workers = Agent::with_client(OrchestratorClient::new(url), 1, Duration::from_millis(50))
            .start()
            .await;

        let id = scheduler.submit("4 / 0").unwrap();

        let summary = wait_until_terminal(&scheduler, &id).await;
        assert_eq!(summary.status, ExpressionStatus::Failed);
        assert_eq!(summary.error.as_deref(), Some("division by zero"));
        assert_eq!(scheduler.status_counts().queued, 0);

        for worker in workers {
            worker.abort();
        }
    }

    #[tokio::test]
    async fn test_agents_report_overflow() {
        let scheduler = Arc::new(Scheduler::new(OperationTimings::instant(), 0));
        let url = spawn_orchestrator(scheduler.clone()).await;

        let workers = Agent::with_client(OrchestratorClient::new(url), 1, Duration::from_millis(50))
            .start()
            .await;

        let big = format!("1{}", "0".repeat(200));
        let id = scheduler.submit(&format!("{} * {}", big, big)).unwrap();

        let summary = wait_until_terminal(&scheduler, &id).await;
        assert_eq!(summary.status, ExpressionStatus::Failed);
        assert_eq!(summary.error.as_deref(), Some("result is not a finite number"));
        assert_eq!(scheduler.status_counts().processing, 0);

        for worker in workers {
            worker.abort();
        }
    }

    #[tokio::test]
    async fn test_agents_keep_full_precision() {
        let scheduler = Arc::new(Scheduler::new(OperationTimings::instant(), 0));
        let url = spawn_orchestrator(scheduler.clone()).await;

        let workers = Agent::with_client(OrchestratorClient::new(url), 2, Duration::from_millis(50))
            .start()
            .await;

        let thirds = scheduler.submit("1 / 3 * 3").unwrap();
        let tiny = scheduler.submit("0.0000001 * 10000000").unwrap();

        let summary = wait_until_terminal(&scheduler, &thirds).await;
        assert_eq!(summary.result, Some(1.0 / 3.0 * 3.0));

        let summary = wait_until_terminal(&scheduler, &tiny).await;
        assert_eq!(summary.result, Some(0.0000001 * 10000000.0));

        for worker in workers {
            worker.abort();
        }
    }
}
