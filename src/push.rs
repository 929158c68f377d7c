use crate::adapters::WebPushSender;
use crate::config;
use crate::error::{Error, Result};
use crate::ports::{DeliveryError, PushSender};
use crate::store::NotificationStore;
use crate::types::UserId;
use crate::types::push::{DispatchOutcome, PushMessage, PushPayload, SubscriptionDescriptor};

pub(crate) mod vapid;

use std::sync::Arc;
use std::time::Duration;

pub(crate) use vapid::{VapidConfigStatus, load_vapid_config};

/// Fans a notification out to every subscription a user owns and prunes
/// the ones the push service reports as gone.
#[derive(Clone)]
pub struct PushDispatcher<S> {
    store: Arc<NotificationStore>,
    sender: Option<S>,
    default_icon: String,
    ttl: Duration,
    timeout: Duration,
}

impl PushDispatcher<WebPushSender> {
    /// Builds the production dispatcher; without complete VAPID keys every
    /// send fails with `TransportNotConfigured`.
    pub fn from_config(config: &config::AppConfig, store: Arc<NotificationStore>) -> Self {
        let sender = match load_vapid_config(config) {
            VapidConfigStatus::Ready(vapid) => match WebPushSender::new(vapid) {
                Ok(sender) => Some(sender),
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        "push notifications disabled: failed to init web-push"
                    );
                    None
                }
            },
            VapidConfigStatus::Incomplete => {
                tracing::warn!("push notifications disabled: incomplete VAPID configuration");
                None
            }
            VapidConfigStatus::Missing => None,
        };
        Self::new(store, sender, config)
    }
}

impl<S: PushSender> PushDispatcher<S> {
    pub fn new(
        store: Arc<NotificationStore>,
        sender: Option<S>,
        config: &config::AppConfig,
    ) -> Self {
        Self {
            store,
            sender,
            default_icon: config.default_icon.clone(),
            ttl: config.push_ttl,
            timeout: config.push_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.sender.is_some()
    }

    /// Every subscription is attempted before any gone endpoint is removed.
    /// A failed removal is logged and retried on the next send.
    pub async fn send(&self, user_id: &UserId, message: PushMessage) -> Result<DispatchOutcome> {
        let payload = self.payload(message)?;
        let Some(sender) = self.sender.as_ref() else {
            return Err(Error::TransportNotConfigured);
        };

        let subscriptions = {
            let user_id = user_id.clone();
            self.store
                .run_blocking(move |store| store.subscriptions_for_user(&user_id))
                .await?
        };
        if subscriptions.is_empty() {
            tracing::debug!(user_id = %user_id, "no push subscriptions");
            return Ok(DispatchOutcome::default());
        }

        let payload = serde_json::to_string(&payload)?;
        let mut outcome = DispatchOutcome::default();
        let mut gone = Vec::new();
        for subscription in &subscriptions {
            match self.attempt(sender, subscription, &payload).await {
                Ok(()) => outcome.sent += 1,
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        user_id = %user_id,
                        endpoint = subscription.endpoint(),
                        status = err.status(),
                        error = %err,
                        "push delivery failed"
                    );
                    if err.is_permanent() {
                        gone.push(subscription.endpoint().to_string());
                    }
                }
            }
        }
        self.prune(gone).await;

        tracing::info!(
            user_id = %user_id,
            sent = outcome.sent,
            failed = outcome.failed,
            "push dispatched"
        );
        Ok(outcome)
    }

    fn payload(&self, message: PushMessage) -> Result<PushPayload> {
        if message.title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        if message.body.trim().is_empty() {
            return Err(Error::EmptyBody);
        }
        Ok(PushPayload {
            title: message.title,
            body: message.body,
            url: non_empty(message.url).unwrap_or_else(|| "/".to_string()),
            icon: non_empty(message.icon).unwrap_or_else(|| self.default_icon.clone()),
        })
    }

    async fn attempt(
        &self,
        sender: &S,
        subscription: &SubscriptionDescriptor,
        payload: &str,
    ) -> std::result::Result<(), DeliveryError> {
        let delivery = sender.send(subscription, payload, self.ttl);
        match tokio::time::timeout(self.timeout, delivery).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimedOut),
        }
    }

    async fn prune(&self, endpoints: Vec<String>) {
        if endpoints.is_empty() {
            return;
        }
        let removal = self
            .store
            .run_blocking(move |store| {
                let mut removed = Vec::new();
                for endpoint in endpoints {
                    if store.unregister_by_endpoint(&endpoint)? {
                        removed.push(endpoint);
                    }
                }
                Ok(removed)
            })
            .await;
        match removal {
            Ok(removed) => {
                for endpoint in removed {
                    tracing::info!(endpoint = %endpoint, "removed dead push subscription");
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to remove dead push subscriptions");
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
