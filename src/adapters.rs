use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use web_push::WebPushError;

use crate::ports::{DeliveryError, PushSender};
use crate::types::push::{SubscriptionDescriptor, VapidConfig};

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn deliver(
        &self,
        subscription: &SubscriptionDescriptor,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), DeliveryError> {
        let (Some(p256dh), Some(auth)) = (subscription.key("p256dh"), subscription.key("auth"))
        else {
            return Err(DeliveryError::Transport(
                "subscription has no encryption keys".to_string(),
            ));
        };
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint().to_string(),
            p256dh.to_string(),
            auth.to_string(),
        );

        let mut builder =
            web_push::WebPushMessageBuilder::new(&subscription_info).map_err(classify)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_ttl(u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX));
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )
        .map_err(classify)?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build().map_err(classify)?);
        let message = builder.build().map_err(classify)?;
        self.client.send(message).await.map_err(classify)
    }
}

impl PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a SubscriptionDescriptor,
        payload: &'a str,
        ttl: Duration,
    ) -> Self::Fut<'a> {
        Box::pin(self.deliver(subscription, payload, ttl))
    }
}

/// Recovers the push service's HTTP status from a web-push error.
fn classify(err: WebPushError) -> DeliveryError {
    let status = match &err {
        WebPushError::EndpointNotValid { .. } => 410,
        WebPushError::EndpointNotFound { .. } => 404,
        WebPushError::Unauthorized { .. } => 401,
        WebPushError::BadRequest { .. } => 400,
        WebPushError::PayloadTooLarge { .. } => 413,
        _ => return DeliveryError::Transport(err.to_string()),
    };
    DeliveryError::Rejected {
        status,
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn classify__should_treat_local_failures_as_transport_errors() {
        let err = classify(WebPushError::InvalidUri);

        assert!(matches!(err, DeliveryError::Transport(_)));
        assert!(!err.is_permanent());
    }

    #[tokio::test]
    async fn send__should_fail_without_keys_before_contacting_push_service() {
        // Given
        let sender = WebPushSender::new(VapidConfig {
            private_key: "unused".to_string(),
            public_key: "unused".to_string(),
            subject: "mailto:test@example.com".to_string(),
        })
        .expect("client");
        let subscription =
            SubscriptionDescriptor::endpoint_only("https://push.example/1".to_string());

        // When
        let result = sender
            .send(&subscription, "{}", Duration::from_secs(60))
            .await;

        // Then
        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }
}
