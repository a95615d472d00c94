//! Expression Scheduler
//!
//! Owns every expression, the task registry and the global FIFO of runnable tasks.
//! Agents pull tasks from here and push results back; each result advances the owning
//! expression by exactly one task.
//!
//! ## Responsibilities
//! - **Submission**: compiling an expression and seeding the queue with its first task.
//! - **Dispatch**: handing out the head of the queue, optionally under a lease.
//! - **Ingestion**: gating results on the expression's current index, substituting the
//!   value into the tasks still waiting on it and queueing the next one.
//! - **Leasing**: returning tasks whose agent went silent to the back of the queue.
//!
//! All state sits behind a single mutex. No operation awaits while holding it.

use super::compiler;
use super::error::SchedulerError;
use super::types::*;

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Where a registered task lives: its expression and its position in that chain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskLocation {
    expression_id: ExpressionId,
    index: usize,
}

#[derive(Debug, Default)]
struct SchedulerState {
    /// Submission order is kept for the list endpoint.
    expressions: IndexMap<ExpressionId, Expression>,
    registry: HashMap<TaskId, TaskLocation>,
    queue: VecDeque<TaskId>,
    /// Dispatched, unresolved tasks and the time (ms) their lease runs out.
    leases: HashMap<TaskId, u64>,
}

/// The orchestrator's shared state, handed to every HTTP handler as `Arc<Scheduler>`.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    timings: OperationTimings,
    /// Lease length in ms. Zero disables leasing: a lost task stalls its expression.
    lease_ms: u64,
}

impl Scheduler {
    pub fn new(timings: OperationTimings, lease_ms: u64) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            timings,
            lease_ms,
        }
    }

    /// Compiles and registers a new expression.
    ///
    /// The first task is queued right away when both of its operands are numbers.
    /// A bare literal has no tasks and completes immediately.
    pub fn submit(&self, source: &str) -> Result<ExpressionId, SchedulerError> {
        // Compilation needs no shared state, keep it outside the lock.
        let chain = compiler::compile(source, &self.timings)?;

        let id = ExpressionId::new();
        let mut expression = Expression {
            id: id.clone(),
            source: source.to_string(),
            chain,
            current_index: 0,
            status: ExpressionStatus::Pending,
            result: None,
            error: None,
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;

        for (index, task) in expression.chain.tasks.iter().enumerate() {
            state.registry.insert(
                task.id.clone(),
                TaskLocation {
                    expression_id: id.clone(),
                    index,
                },
            );
        }

        match expression.chain.tasks.first() {
            None => {
                expression.status = ExpressionStatus::Completed;
                expression.result = expression.chain.output.value();
                tracing::info!("Expression {} is a literal, completed immediately", id);
            }
            Some(first) if first.is_eligible() => {
                state.queue.push_back(first.id.clone());
                expression.status = ExpressionStatus::Processing;
                tracing::info!(
                    "Expression {} accepted with {} tasks",
                    id,
                    expression.chain.len()
                );
            }
            Some(_) => {
                tracing::warn!("Expression {} has no runnable first task", id);
            }
        }

        state.expressions.insert(id.clone(), expression);
        Ok(id)
    }

    /// Pops the head of the queue, or `None` when there is nothing to do.
    ///
    /// Never blocks. Entries that went stale (expression failed, or already resolved
    /// through a late result) are dropped on the way.
    pub fn next_task(&self) -> Option<Task> {
        self.next_task_at(now_ms())
    }

    pub(crate) fn next_task_at(&self, now: u64) -> Option<Task> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        while let Some(task_id) = state.queue.pop_front() {
            let Some(task) = dispatchable(&state.expressions, &state.registry, &task_id) else {
                tracing::debug!("Dropping stale queue entry {}", task_id);
                continue;
            };
            let task = task.clone();

            if self.lease_ms > 0 {
                state.leases.insert(task_id.clone(), now + self.lease_ms);
            }

            tracing::debug!(
                "Dispatching task {} ({} {} {})",
                task_id,
                task.arg1,
                task.operation.symbol(),
                task.arg2
            );
            return Some(task);
        }

        None
    }

    /// Accepts the result of the current task of an expression.
    ///
    /// Fails with `TaskNotCurrent` for duplicate, stale or out-of-order results;
    /// the expression is left untouched in that case.
    pub fn submit_result(&self, task_id: &TaskId, result: f64) -> Result<(), SchedulerError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let location = locate_current(state, task_id)?;
        release(state, task_id);

        let Some(expression) = state.expressions.get_mut(&location.expression_id) else {
            return Err(SchedulerError::ExpressionNotFound(location.expression_id));
        };

        let completed = location.index;
        expression.current_index += 1;

        // Later tasks may consume this result too, not only the next one.
        for task in expression.chain.tasks.iter_mut().skip(expression.current_index) {
            task.resolve(completed, result);
        }

        match expression.chain.tasks.get(expression.current_index) {
            Some(next) => {
                if next.is_eligible() {
                    state.queue.push_back(next.id.clone());
                    tracing::debug!(
                        "Task {} resolved to {}, queued task {} of expression {}",
                        task_id,
                        result,
                        expression.current_index,
                        expression.id
                    );
                } else {
                    tracing::warn!(
                        "Task {} of expression {} still waits on an unresolved operand",
                        expression.current_index,
                        expression.id
                    );
                }
            }
            None => {
                expression.status = ExpressionStatus::Completed;
                expression.result = Some(result);
                tracing::info!("Expression {} completed: {}", expression.id, result);
            }
        }

        Ok(())
    }

    /// Records that an agent could not compute the current task of an expression.
    ///
    /// The whole expression fails immediately; there is no retry.
    pub fn report_failure(&self, task_id: &TaskId, reason: &str) -> Result<(), SchedulerError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let location = locate_current(state, task_id)?;
        release(state, task_id);

        let Some(expression) = state.expressions.get_mut(&location.expression_id) else {
            return Err(SchedulerError::ExpressionNotFound(location.expression_id));
        };

        expression.status = ExpressionStatus::Failed;
        expression.error = Some(reason.to_string());

        tracing::warn!(
            "Expression {} failed at task {}: {}",
            expression.id,
            location.index,
            reason
        );
        Ok(())
    }

    /// Returns every task whose lease has run out to the back of the queue.
    pub fn requeue_expired(&self) -> usize {
        self.requeue_expired_at(now_ms())
    }

    pub(crate) fn requeue_expired_at(&self, now: u64) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let expired: Vec<TaskId> = state
            .leases
            .iter()
            .filter(|(_, expires)| now >= **expires)
            .map(|(task_id, _)| task_id.clone())
            .collect();

        let mut requeued = 0;
        for task_id in expired {
            state.leases.remove(&task_id);

            if state.queue.contains(&task_id)
                || dispatchable(&state.expressions, &state.registry, &task_id).is_none()
            {
                continue;
            }

            tracing::warn!("Lease expired for task {}, requeueing", task_id);
            state.queue.push_back(task_id);
            requeued += 1;
        }

        requeued
    }

    /// All expressions, in submission order.
    pub fn list_expressions(&self) -> Vec<ExpressionSummary> {
        let state = self.state.lock();
        state.expressions.values().map(Expression::summary).collect()
    }

    pub fn get_expression(&self, id: &ExpressionId) -> Result<ExpressionSummary, SchedulerError> {
        let state = self.state.lock();
        state
            .expressions
            .get(id)
            .map(Expression::summary)
            .ok_or_else(|| SchedulerError::ExpressionNotFound(id.clone()))
    }

    /// Full copy of an expression record, including its task chain.
    pub fn expression_snapshot(&self, id: &ExpressionId) -> Option<Expression> {
        self.state.lock().expressions.get(id).cloned()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let state = self.state.lock();
        let mut counts = StatusCounts {
            queued: state.queue.len(),
            leased: state.leases.len(),
            ..StatusCounts::default()
        };

        for expression in state.expressions.values() {
            match expression.status {
                ExpressionStatus::Pending => counts.pending += 1,
                ExpressionStatus::Processing => counts.processing += 1,
                ExpressionStatus::Completed => counts.completed += 1,
                ExpressionStatus::Failed => counts.failed += 1,
            }
        }

        counts
    }
}

/// Registry lookup plus the current-index gate shared by result and failure ingestion.
fn locate_current(state: &SchedulerState, task_id: &TaskId) -> Result<TaskLocation, SchedulerError> {
    let location = state
        .registry
        .get(task_id)
        .cloned()
        .ok_or_else(|| SchedulerError::TaskNotFound(task_id.clone()))?;

    let expression = state
        .expressions
        .get(&location.expression_id)
        .ok_or_else(|| SchedulerError::ExpressionNotFound(location.expression_id.clone()))?;

    if expression.status.is_terminal() || location.index != expression.current_index {
        return Err(SchedulerError::TaskNotCurrent {
            task_id: task_id.clone(),
            index: location.index,
            current: expression.current_index,
        });
    }

    Ok(location)
}

/// Drops the lease and any queued copy of a task that has just been resolved.
fn release(state: &mut SchedulerState, task_id: &TaskId) {
    state.leases.remove(task_id);
    state.queue.retain(|queued| queued != task_id);
}

/// The task behind `task_id` if it may still be handed to an agent.
fn dispatchable<'a>(
    expressions: &'a IndexMap<ExpressionId, Expression>,
    registry: &HashMap<TaskId, TaskLocation>,
    task_id: &TaskId,
) -> Option<&'a Task> {
    let location = registry.get(task_id)?;
    let expression = expressions.get(&location.expression_id)?;

    if expression.status.is_terminal() || location.index != expression.current_index {
        return None;
    }

    expression.current_task().filter(|task| task.is_eligible())
}
