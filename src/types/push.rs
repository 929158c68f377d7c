use crate::error::Error;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// A browser push subscription exactly as the client handed it over.
///
/// The endpoint is pulled out once when the descriptor is built; everything
/// else stays in `raw` and is replayed to the transport verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDescriptor {
    endpoint: String,
    raw: Map<String, Value>,
}

impl SubscriptionDescriptor {
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(raw) => Self::try_from(raw),
            _ => Err(Error::InvalidSubscription),
        }
    }

    /// Minimal descriptor used when the stored one can no longer be read.
    pub(crate) fn endpoint_only(endpoint: String) -> Self {
        let mut raw = Map::new();
        raw.insert("endpoint".to_string(), Value::String(endpoint.clone()));
        Self { endpoint, raw }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Credential material, or an empty object when the client sent none.
    pub fn keys(&self) -> Value {
        self.raw
            .get("keys")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    pub(crate) fn key(&self, name: &str) -> Option<&str> {
        self.raw.get("keys")?.get(name)?.as_str()
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl TryFrom<Map<String, Value>> for SubscriptionDescriptor {
    type Error = Error;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let endpoint = match raw.get("endpoint") {
            Some(Value::String(endpoint)) if !endpoint.trim().is_empty() => endpoint.clone(),
            _ => return Err(Error::InvalidSubscription),
        };
        Ok(Self { endpoint, raw })
    }
}

impl Serialize for SubscriptionDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// What a caller asks to deliver; optional fields fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub icon: Option<String>,
}

/// The JSON document the service worker receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value__should_keep_descriptor_verbatim() {
        // Given
        let value = json!({
            "endpoint": "https://push.example/abc",
            "expirationTime": null,
            "keys": {"p256dh": "p256", "auth": "auth"}
        });

        // When
        let descriptor = SubscriptionDescriptor::from_value(value.clone()).expect("valid");

        // Then
        assert_eq!(descriptor.endpoint(), "https://push.example/abc");
        assert_eq!(descriptor.key("auth"), Some("auth"));
        assert_eq!(serde_json::to_value(&descriptor).expect("serialize"), value);
    }

    #[test]
    fn from_value__should_reject_missing_or_blank_endpoint() {
        for value in [
            json!({"keys": {}}),
            json!({"endpoint": ""}),
            json!({"endpoint": 12}),
            json!("https://push.example/abc"),
        ] {
            let err = SubscriptionDescriptor::from_value(value).expect_err("invalid");
            assert!(matches!(err, Error::InvalidSubscription));
        }
    }

    #[test]
    fn keys__should_default_to_empty_object() {
        let descriptor = SubscriptionDescriptor::endpoint_only("E1".to_string());

        assert_eq!(descriptor.keys(), json!({}));
        assert_eq!(descriptor.key("p256dh"), None);
    }
}
