//! HTTP API for the activation service.

use crate::error::ServerError;
use crate::service::{EnterpriseService, GetStateResponse};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivateRequest {
    pub activation_code: String,
}

/// Empty on success.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ActivateResponse {}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    /// Machine-readable error kind.
    pub error: String,
    pub message: String,
}

/// Maps service errors onto HTTP responses.
pub struct ApiError(ServerError);

impl From<ServerError> for ApiError {
    fn from(e: ServerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            ServerError::Validation(e) => (StatusCode::BAD_REQUEST, e.kind()),
            ServerError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_error"),
        };
        let body = ErrorResponse {
            error: kind.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn activate_handler(
    State(service): State<Arc<EnterpriseService>>,
    Json(request): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>, ApiError> {
    service.activate(&request.activation_code).await?;
    Ok(Json(ActivateResponse {}))
}

async fn state_handler(State(service): State<Arc<EnterpriseService>>) -> Json<GetStateResponse> {
    Json(service.get_state())
}

/// Build the HTTP API router over the given service.
pub fn build_router(service: Arc<EnterpriseService>) -> Router {
    Router::new()
        .route("/api/v1/activate", post(activate_handler))
        .route("/api/v1/state", get(state_handler))
        .with_state(service)
}
