use crate::app::ApiError;
use crate::ports::PushSender;
use crate::state;
use crate::types::UserId;
use crate::types::toast::{ToastContext, ToastEntry, ToastVariant};

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateToastRequest {
    pub(crate) user_id: UserId,
    pub(crate) message: String,
    #[serde(rename = "type")]
    pub(crate) variant: Option<String>,
    pub(crate) context: Option<ToastContext>,
}

#[derive(Serialize)]
pub(crate) struct CreateToastResponse {
    pub(crate) ok: bool,
    pub(crate) id: i64,
}

pub(crate) async fn create_toast<S: PushSender>(
    State(state): State<state::AppState<S>>,
    Json(request): Json<CreateToastRequest>,
) -> Result<Json<CreateToastResponse>, ApiError> {
    let variant = match request.variant.as_deref() {
        Some(variant) => variant.parse()?,
        None => ToastVariant::default(),
    };
    let id = state
        .store
        .run_blocking(move |store| {
            store.enqueue_toast(
                &request.user_id,
                &request.message,
                variant,
                request.context.unwrap_or_default(),
            )
        })
        .await?;
    Ok(Json(CreateToastResponse { ok: true, id }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PollQuery {
    pub(crate) user_id: String,
}

#[derive(Serialize)]
pub(crate) struct PollResponse {
    pub(crate) ok: bool,
    pub(crate) items: Vec<ToastEntry>,
}

pub(crate) async fn poll_toasts<S: PushSender>(
    State(state): State<state::AppState<S>>,
    Query(query): Query<PollQuery>,
) -> Result<Json<PollResponse>, ApiError> {
    let user_id = UserId::from(query.user_id);
    let items = state
        .store
        .run_blocking(move |store| store.drain_toasts(&user_id))
        .await?;
    Ok(Json(PollResponse { ok: true, items }))
}
