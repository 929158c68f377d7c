use crate::app::{ApiError, OkResponse};
use crate::error::Error;
use crate::ports::PushSender;
use crate::push::{VapidConfigStatus, load_vapid_config};
use crate::state;
use crate::types::UserId;
use crate::types::push::PushMessage;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterSubscriptionRequest {
    pub(crate) user_id: UserId,
    pub(crate) subscription: Value,
}

pub(crate) async fn register_subscription<S: PushSender>(
    State(state): State<state::AppState<S>>,
    Json(request): Json<RegisterSubscriptionRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .store
        .run_blocking(move |store| {
            store.register_subscription(&request.user_id, request.subscription)
        })
        .await?;
    Ok(OkResponse::ok())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnregisterSubscriptionRequest {
    pub(crate) endpoint: String,
}

pub(crate) async fn unregister_subscription<S: PushSender>(
    State(state): State<state::AppState<S>>,
    Json(request): Json<UnregisterSubscriptionRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .store
        .run_blocking(move |store| store.unregister_by_endpoint(&request.endpoint))
        .await?;
    Ok(OkResponse::ok())
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendPushRequest {
    pub(crate) user_id: UserId,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) url: Option<String>,
    pub(crate) icon: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct SendPushResponse {
    pub(crate) ok: bool,
    pub(crate) sent: usize,
    pub(crate) failed: usize,
}

pub(crate) async fn send_push<S: PushSender>(
    State(state): State<state::AppState<S>>,
    Json(request): Json<SendPushRequest>,
) -> Result<Json<SendPushResponse>, ApiError> {
    let message = PushMessage {
        title: request.title,
        body: request.body,
        url: request.url,
        icon: request.icon,
    };
    let outcome = state.dispatcher.send(&request.user_id, message).await?;
    Ok(Json(SendPushResponse {
        ok: true,
        sent: outcome.sent,
        failed: outcome.failed,
    }))
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

/// Advertises the VAPID public key only while the dispatcher can deliver.
pub(crate) async fn public_key<S: PushSender>(
    State(state): State<state::AppState<S>>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    if !state.dispatcher.is_configured() {
        return Err(Error::TransportNotConfigured.into());
    }
    match load_vapid_config(&state.config) {
        VapidConfigStatus::Ready(vapid) => Ok(Json(PublicKeyResponse {
            public_key: vapid.public_key,
        })),
        VapidConfigStatus::Incomplete | VapidConfigStatus::Missing => {
            Err(Error::TransportNotConfigured.into())
        }
    }
}
