use super::error::SchedulerError;
use super::protocol::*;
use super::scheduler::Scheduler;
use super::types::*;

use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::Path, http::StatusCode};
use std::sync::Arc;

/// Builds the orchestrator's HTTP surface around a shared scheduler.
pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route(ENDPOINT_CALCULATE, post(handle_calculate))
        .route(ENDPOINT_EXPRESSIONS, get(handle_list_expressions))
        .route(ENDPOINT_EXPRESSION, get(handle_get_expression))
        .route(
            ENDPOINT_INTERNAL_TASK,
            get(handle_get_task).post(handle_task_result),
        )
        .layer(Extension(scheduler))
}

fn error_status(error: &SchedulerError) -> StatusCode {
    match error {
        SchedulerError::InvalidExpression(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulerError::TaskNotFound(_) | SchedulerError::ExpressionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        SchedulerError::TaskNotCurrent { .. } => StatusCode::BAD_REQUEST,
    }
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

pub async fn handle_calculate(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Rejected calculate request body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    match scheduler.submit(&req.expression) {
        Ok(id) => {
            tracing::info!("Expression submitted successfully: {}", id);
            (StatusCode::CREATED, Json(CalculateResponse { id })).into_response()
        }
        Err(e) => {
            tracing::warn!("Rejected expression '{}': {}", req.expression, e);
            error_response(error_status(&e), e)
        }
    }
}

pub async fn handle_list_expressions(
    Extension(scheduler): Extension<Arc<Scheduler>>,
) -> (StatusCode, Json<ExpressionsResponse>) {
    let expressions = scheduler.list_expressions();
    (StatusCode::OK, Json(ExpressionsResponse { expressions }))
}

pub async fn handle_get_expression(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Path(id_str): Path<String>,
) -> Response {
    let id = ExpressionId(id_str);

    match scheduler.get_expression(&id) {
        Ok(expression) => (StatusCode::OK, Json(ExpressionResponse { expression })).into_response(),
        Err(e) => {
            tracing::debug!("Expression query failed: {}", e);
            error_response(error_status(&e), e)
        }
    }
}

pub async fn handle_get_task(Extension(scheduler): Extension<Arc<Scheduler>>) -> Response {
    match scheduler.next_task() {
        Some(task) => {
            let task = TaskPayload::from(&task);
            tracing::info!("Handing out task {} ({:?})", task.id, task.operation);
            (StatusCode::OK, Json(TaskResponse { task })).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "No task available"),
    }
}

pub async fn handle_task_result(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    payload: Result<Json<TaskResultRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Rejected task result body: {}", e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid request body");
        }
    };

    let outcome = match (req.result, req.error) {
        (_, Some(reason)) => scheduler.report_failure(&req.id, &reason),
        (Some(result), None) => scheduler.submit_result(&req.id, result),
        (None, None) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Either result or error must be provided",
            );
        }
    };

    match outcome {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!("Rejected outcome for task {}: {}", req.id, e);
            error_response(error_status(&e), e)
        }
    }
}
