use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, warn};

use super::error::ErrorKind;
use super::grid::default_grid_base;
use super::queries::{QueryOptions, SalaryQueries};

/// Router builder exposing the salary queries over HTTP.
pub fn salary_router(queries: Arc<SalaryQueries>) -> Router {
    Router::new()
        .route("/api/v1/salary/predict", post(predict_handler))
        .route("/api/v1/salary/inverse", post(inverse_handler))
        .route("/api/v1/salary/grid", post(grid_handler))
        .route("/api/v1/salary/model", get(model_handler))
        .with_state(queries)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictRequest {
    #[serde(default)]
    payload: Map<String, Value>,
    #[serde(default)]
    use_mock: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InverseRequest {
    target_salary: f64,
    #[serde(default)]
    constraints: Option<Value>,
    #[serde(default)]
    use_mock: Option<bool>,
    #[serde(default)]
    top_n: Option<usize>,
    #[serde(default)]
    allow_partial: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GridRequest {
    grid_spec: Value,
    #[serde(default)]
    base_payload: Option<Map<String, Value>>,
    #[serde(default)]
    use_mock: Option<bool>,
    #[serde(default)]
    allow_partial: bool,
}

pub(crate) async fn predict_handler(
    State(queries): State<Arc<SalaryQueries>>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejected(rejection),
    };
    let use_mock = request.use_mock.unwrap_or_else(|| queries.default_use_mock());
    let response = queries.predict_salary(&request.payload, use_mock);
    respond(response.error_kind, &response)
}

pub(crate) async fn inverse_handler(
    State(queries): State<Arc<SalaryQueries>>,
    request: Result<Json<InverseRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejected(rejection),
    };
    let task = tokio::task::spawn_blocking(move || {
        let use_mock = request.use_mock.unwrap_or_else(|| queries.default_use_mock());
        let options = QueryOptions {
            allow_partial: request.allow_partial,
            ..QueryOptions::default()
        };
        queries.inverse_salary_search_with(
            request.target_salary,
            request.constraints.as_ref(),
            use_mock,
            request.top_n,
            &options,
        )
    });

    match task.await {
        Ok(response) => respond(response.error_kind, &response),
        Err(join_error) => worker_failure(join_error),
    }
}

pub(crate) async fn grid_handler(
    State(queries): State<Arc<SalaryQueries>>,
    request: Result<Json<GridRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejected(rejection),
    };
    let task = tokio::task::spawn_blocking(move || {
        let use_mock = request.use_mock.unwrap_or_else(|| queries.default_use_mock());
        let base = request.base_payload.unwrap_or_else(default_grid_base);
        let options = QueryOptions {
            allow_partial: request.allow_partial,
            ..QueryOptions::default()
        };
        queries.salary_grid_with(&request.grid_spec, &base, use_mock, &options)
    });

    match task.await {
        Ok(response) => respond(response.error_kind, &response),
        Err(join_error) => worker_failure(join_error),
    }
}

pub(crate) async fn model_handler(State(queries): State<Arc<SalaryQueries>>) -> Response {
    let response = queries.model_info();
    respond(response.error_kind, &response)
}

pub(crate) fn status_for(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::ValidationError) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::ModelUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
        Some(ErrorKind::TooManyCombinations) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::PredictionError) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(ErrorKind::Cancelled) => StatusCode::REQUEST_TIMEOUT,
    }
}

fn respond<T: Serialize>(kind: Option<ErrorKind>, body: &T) -> Response {
    (status_for(kind), Json(body)).into_response()
}

/// Bodies axum cannot decode get the same error shape as a failed query.
fn rejected(rejection: JsonRejection) -> Response {
    let message = rejection.body_text();
    warn!(status = %rejection.status(), error = %message, "salary request body rejected");
    let kind = ErrorKind::ValidationError;
    let payload = json!({
        "status": "error",
        "error": format!("invalid request body: {message}"),
        "error_kind": kind,
    });
    respond(Some(kind), &payload)
}

fn worker_failure(join_error: tokio::task::JoinError) -> Response {
    error!(error = %join_error, "salary query worker failed");
    let payload = json!({
        "status": "error",
        "error": "salary query worker failed",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
