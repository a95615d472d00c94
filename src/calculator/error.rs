//! Error types for expression compilation and scheduling.

use super::types::{ExpressionId, TaskId};
use thiserror::Error;

/// Reasons an expression string cannot be turned into a task chain.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("mismatched parentheses")]
    MismatchedParentheses,

    #[error("operator '{0}' is missing an operand")]
    MissingOperand(char),

    #[error("malformed expression: {0} values left without an operator")]
    DanglingOperands(usize),

    #[error("expression is empty")]
    EmptyExpression,
}

/// Failures surfaced by the scheduler to submitters and agents.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchedulerError {
    #[error("expression is not valid: {0}")]
    InvalidExpression(#[from] CompileError),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("expression not found: {0}")]
    ExpressionNotFound(ExpressionId),

    #[error("task {task_id} is not the current one (task index {index}, expected {current})")]
    TaskNotCurrent {
        task_id: TaskId,
        index: usize,
        current: usize,
    },
}
