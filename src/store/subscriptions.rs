use super::{NotificationStore, now_timestamp};
use crate::error::Result;
use crate::types::UserId;
use crate::types::push::SubscriptionDescriptor;

use rusqlite::params;
use serde_json::Value;

impl NotificationStore {
    /// Stores the descriptor under its endpoint. An endpoint already on file
    /// moves to `user_id` and takes the new key material.
    pub fn register_subscription(&self, user_id: &UserId, descriptor: Value) -> Result<()> {
        let descriptor = SubscriptionDescriptor::from_value(descriptor)?;
        let keys_json = serde_json::to_string(&descriptor.keys())?;
        let subscription_json = serde_json::to_string(descriptor.raw())?;
        let now = now_timestamp();

        self.write(|tx| {
            tx.execute(
                "INSERT INTO user_push_tokens
                    (user_id, endpoint, keys_json, subscription_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(endpoint) DO UPDATE SET
                    user_id = excluded.user_id,
                    keys_json = excluded.keys_json,
                    subscription_json = excluded.subscription_json,
                    updated_at = excluded.updated_at",
                params![
                    user_id.as_str(),
                    descriptor.endpoint(),
                    keys_json,
                    subscription_json,
                    now
                ],
            )?;
            Ok(())
        })?;
        tracing::debug!(
            user_id = %user_id,
            endpoint = descriptor.endpoint(),
            "subscription registered"
        );
        Ok(())
    }

    pub fn subscriptions_for_user(&self, user_id: &UserId) -> Result<Vec<SubscriptionDescriptor>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT endpoint, subscription_json FROM user_push_tokens
             WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![user_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut descriptors = Vec::new();
        for row in rows {
            let (endpoint, subscription_json) = row?;
            descriptors.push(decode_descriptor(endpoint, &subscription_json));
        }
        Ok(descriptors)
    }

    /// Removing an endpoint that is not on file is not an error.
    pub fn unregister_by_endpoint(&self, endpoint: &str) -> Result<bool> {
        let removed = self.write(|tx| {
            let rows = tx.execute(
                "DELETE FROM user_push_tokens WHERE endpoint = ?1",
                params![endpoint],
            )?;
            Ok(rows > 0)
        })?;
        if removed {
            tracing::debug!(endpoint, "subscription removed");
        }
        Ok(removed)
    }
}

fn decode_descriptor(endpoint: String, subscription_json: &str) -> SubscriptionDescriptor {
    let decoded = serde_json::from_str::<Value>(subscription_json)
        .map_err(|err| err.to_string())
        .and_then(|value| {
            SubscriptionDescriptor::from_value(value).map_err(|err| err.to_string())
        });
    match decoded {
        Ok(descriptor) => descriptor,
        Err(err) => {
            tracing::warn!(
                endpoint = %endpoint,
                error = %err,
                "stored subscription unreadable, using endpoint only"
            );
            SubscriptionDescriptor::endpoint_only(endpoint)
        }
    }
}
