use crate::application::service::{Acknowledgement, SupplementService};
use crate::domain::slot::ResultSlot;
use crate::error::{Result, SupplementError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::future::Future;
use tokio::net::TcpListener;

/// `POST /submit` and `GET /result/{id}` over a shared service.
pub fn router(service: SupplementService) -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/result/{id}", get(result))
        .with_state(service)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, service: SupplementService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn submit(
    State(service): State<SupplementService>,
    Json(raw): Json<Value>,
) -> std::result::Result<Json<Acknowledgement>, ApiError> {
    Ok(Json(service.submit(&raw).await?))
}

async fn result(
    State(service): State<SupplementService>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ResultSlot>, ApiError> {
    Ok(Json(service.poll(&id).await?))
}

struct ApiError(SupplementError);

impl From<SupplementError> for ApiError {
    fn from(err: SupplementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SupplementError::Validation(_) => StatusCode::BAD_REQUEST,
            SupplementError::DuplicateKey(_) => StatusCode::CONFLICT,
            SupplementError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
