//! Arithmetic execution of a single dispatched task.

use crate::calculator::protocol::TaskPayload;
use crate::calculator::types::Operation;

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComputeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    #[error("result is not a finite number")]
    NonFiniteResult,
}

fn parse_operand(text: &str) -> Result<f64, ComputeError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ComputeError::InvalidOperand(text.to_string()))
}

/// Overflow to infinity is an error: the value could not be reported over JSON.
pub fn apply(operation: Operation, left: f64, right: f64) -> Result<f64, ComputeError> {
    let value = match operation {
        Operation::Addition => left + right,
        Operation::Subtraction => left - right,
        Operation::Multiplication => left * right,
        Operation::Division if right == 0.0 => return Err(ComputeError::DivisionByZero),
        Operation::Division => left / right,
    };

    if !value.is_finite() {
        return Err(ComputeError::NonFiniteResult);
    }
    Ok(value)
}

/// Computes a task, taking at least its nominal `operation_time`.
pub async fn compute(task: &TaskPayload) -> Result<f64, ComputeError> {
    let left = parse_operand(&task.arg1)?;
    let right = parse_operand(&task.arg2)?;
    let value = apply(task.operation, left, right)?;

    if task.operation_time > 0 {
        tokio::time::sleep(Duration::from_millis(task.operation_time)).await;
    }

    Ok(value)
}
