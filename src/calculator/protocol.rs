//! Network Protocol Definitions
//!
//! Defines the Data Transfer Objects (DTOs) exchanged with clients (expression
//! submission and queries) and with agents (task dispatch and result reporting).
//!
//! Constants define the HTTP endpoints shared by the orchestrator router and the agent client.

use super::types::*;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_CALCULATE: &str = "/api/v1/calculate";
pub const ENDPOINT_EXPRESSIONS: &str = "/api/v1/expressions";
pub const ENDPOINT_EXPRESSION: &str = "/api/v1/expressions/:id";
pub const ENDPOINT_INTERNAL_TASK: &str = "/internal/task";

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: ExpressionId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionsResponse {
    pub expressions: Vec<ExpressionSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionResponse {
    pub expression: ExpressionSummary,
}

/// A task as seen by an agent. Operands travel as fixed-point decimal text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskPayload {
    pub id: TaskId,
    pub arg1: String,
    pub arg2: String,
    pub operation: Operation,
    pub operation_time: u64,
}

impl From<&Task> for TaskPayload {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            arg1: task.arg1.to_string(),
            arg2: task.arg2.to_string(),
            operation: task.operation,
            operation_time: task.operation_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: TaskPayload,
}

/// Outcome reported by an agent: either `result` or `error` must be set.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResultRequest {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
