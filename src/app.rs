use crate::error::Error;
use crate::ports::PushSender;
use crate::state;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;

mod push;
mod toasts;

pub fn app<S: PushSender>(state: state::AppState<S>) -> Router {
    Router::new()
        .route(
            "/api/notifications/toast",
            get(toasts::poll_toasts::<S>).post(toasts::create_toast::<S>),
        )
        .route(
            "/api/notifications/register-subscription",
            post(push::register_subscription::<S>),
        )
        .route(
            "/api/notifications/unregister-subscription",
            post(push::unregister_subscription::<S>),
        )
        .route("/api/notifications/push", post(push::send_push::<S>))
        .route("/api/notifications/public-key", get(push::public_key::<S>))
        .route("/healthz", get(health))
        .with_state(state)
}

#[derive(Serialize)]
pub(crate) struct OkResponse {
    pub(crate) ok: bool,
}

impl OkResponse {
    pub(crate) fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

pub(crate) async fn health() -> Json<OkResponse> {
    OkResponse::ok()
}

#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

/// Maps core failures onto HTTP statuses; internal details stay in the log.
pub(crate) struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            err if err.is_validation() => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::TransportNotConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string())
            }
            err => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (
            status,
            Json(ErrorResponse {
                ok: false,
                error: message,
            }),
        )
            .into_response()
    }
}
