use super::{NotificationStore, now_timestamp};
use crate::error::{Error, Result};
use crate::types::UserId;
use crate::types::toast::{ToastContext, ToastEntry, ToastVariant};

use rusqlite::{Row, params};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

impl NotificationStore {
    /// Appends a toast to the user's queue and returns its id.
    pub fn enqueue_toast(
        &self,
        user_id: &UserId,
        message: &str,
        variant: ToastVariant,
        context: ToastContext,
    ) -> Result<i64> {
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        let context_json = serde_json::to_string(&context)?;

        self.write(|tx| {
            tx.execute(
                "INSERT INTO toast_notifications
                    (user_id, message, variant, context_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_id.as_str(),
                    message,
                    variant.as_str(),
                    context_json,
                    now_timestamp()
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Returns every pending toast for the user, oldest first, and deletes
    /// them in the same transaction.
    pub fn drain_toasts(&self, user_id: &UserId) -> Result<Vec<ToastEntry>> {
        self.write(|tx| {
            let entries = {
                let mut stmt = tx.prepare(
                    "SELECT id, message, variant, context_json, created_at
                     FROM toast_notifications WHERE user_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![user_id.as_str()], |row| {
                    toast_from_row(user_id, row)
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            if let Some(last) = entries.last() {
                tx.execute(
                    "DELETE FROM toast_notifications WHERE user_id = ?1 AND id <= ?2",
                    params![user_id.as_str(), last.id],
                )?;
            }
            Ok(entries)
        })
    }
}

fn toast_from_row(user_id: &UserId, row: &Row<'_>) -> rusqlite::Result<ToastEntry> {
    let id: i64 = row.get(0)?;
    let context_json: Option<String> = row.get(3)?;

    Ok(ToastEntry {
        id,
        user_id: user_id.clone(),
        message: row.get(1)?,
        variant: parse_variant(id, row.get_ref(2)?.as_str().ok()),
        context: parse_context(id, context_json.as_deref()),
        created_at: parse_created_at(id, row.get_ref(4)?.as_str().ok()),
    })
}

fn parse_variant(id: i64, variant: Option<&str>) -> ToastVariant {
    match variant.map(str::parse::<ToastVariant>) {
        Some(Ok(variant)) => variant,
        _ => {
            tracing::warn!(toast_id = id, variant, "unknown toast variant, using info");
            ToastVariant::default()
        }
    }
}

/// Accepts RFC 3339 and offset-less ISO 8601 timestamps; the latter are
/// taken as UTC.
fn parse_created_at(id: i64, created_at: Option<&str>) -> OffsetDateTime {
    let parsed = created_at.and_then(|created_at| {
        OffsetDateTime::parse(created_at, &Rfc3339)
            .or_else(|_| {
                PrimitiveDateTime::parse(created_at, &Iso8601::DEFAULT)
                    .map(PrimitiveDateTime::assume_utc)
            })
            .ok()
    });
    match parsed {
        Some(created_at) => created_at,
        None => {
            tracing::warn!(toast_id = id, created_at, "unreadable toast timestamp");
            OffsetDateTime::UNIX_EPOCH
        }
    }
}

fn parse_context(id: i64, context_json: Option<&str>) -> ToastContext {
    let Some(context_json) = context_json else {
        return ToastContext::new();
    };
    match serde_json::from_str(context_json) {
        Ok(context) => context,
        Err(err) => {
            tracing::warn!(toast_id = id, error = %err, "dropping unreadable toast context");
            ToastContext::new()
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn context(value: serde_json::Value) -> ToastContext {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    #[test]
    fn drain_toasts__should_return_enqueued_toast_once() {
        // Given
        let store = NotificationStore::in_memory().expect("store");
        let user = UserId::from("u1");
        let before = OffsetDateTime::now_utc().replace_nanosecond(0).expect("truncate");
        let id = store
            .enqueue_toast(
                &user,
                "Build complete",
                ToastVariant::Success,
                context(json!({"job": 42})),
            )
            .expect("enqueue");

        // When
        let first = store.drain_toasts(&user).expect("first drain");
        let second = store.drain_toasts(&user).expect("second drain");

        // Then
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, id);
        assert_eq!(first[0].message, "Build complete");
        assert_eq!(first[0].variant, ToastVariant::Success);
        assert_eq!(first[0].context, context(json!({"job": 42})));
        assert!(first[0].created_at >= before);
        assert!(second.is_empty());
    }

    #[test]
    fn drain_toasts__should_preserve_enqueue_order() {
        // Given
        let store = NotificationStore::in_memory().expect("store");
        let user = UserId::from("u1");
        let messages = ["one", "two", "three", "four"];
        let mut ids = Vec::new();
        for message in messages {
            ids.push(
                store
                    .enqueue_toast(&user, message, ToastVariant::Info, ToastContext::new())
                    .expect("enqueue"),
            );
        }

        // When
        let drained = store.drain_toasts(&user).expect("drain");

        // Then
        let drained_messages: Vec<_> = drained
            .iter()
            .map(|entry| entry.message.as_str())
            .collect();
        let drained_ids: Vec<_> = drained.iter().map(|entry| entry.id).collect();
        assert_eq!(drained_messages, messages);
        assert_eq!(drained_ids, ids);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn drain_toasts__should_not_touch_other_users() {
        // Given
        let store = NotificationStore::in_memory().expect("store");
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        store
            .enqueue_toast(&alice, "for alice", ToastVariant::Info, ToastContext::new())
            .expect("enqueue");
        store
            .enqueue_toast(&bob, "for bob", ToastVariant::Warning, ToastContext::new())
            .expect("enqueue");

        // When
        let drained = store.drain_toasts(&alice).expect("drain alice");

        // Then
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "for alice");
        let remaining = store.drain_toasts(&bob).expect("drain bob");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].variant, ToastVariant::Warning);
    }

    #[test]
    fn drain_toasts__should_return_empty_when_nothing_pending() {
        let store = NotificationStore::in_memory().expect("store");

        let drained = store.drain_toasts(&UserId::from("nobody")).expect("drain");

        assert!(drained.is_empty());
    }

    #[test]
    fn enqueue_toast__should_reject_empty_message_without_writing() {
        // Given
        let store = NotificationStore::in_memory().expect("store");
        let user = UserId::from("u1");

        // When
        let err = store
            .enqueue_toast(&user, "  ", ToastVariant::Info, ToastContext::new())
            .expect_err("empty message");

        // Then
        assert!(matches!(err, Error::EmptyMessage));
        assert!(store.drain_toasts(&user).expect("drain").is_empty());
    }

    #[test]
    fn drain_toasts__should_degrade_unreadable_context_to_empty() {
        // Given
        let store = NotificationStore::in_memory().expect("store");
        let user = UserId::from("u1");
        store
            .enqueue_toast(&user, "hello", ToastVariant::Info, context(json!({"a": 1})))
            .expect("enqueue");
        store
            .lock()
            .expect("lock")
            .execute("UPDATE toast_notifications SET context_json = '{broken'", [])
            .expect("corrupt row");

        // When
        let drained = store.drain_toasts(&user).expect("drain");

        // Then
        assert_eq!(drained.len(), 1);
        assert!(drained[0].context.is_empty());
    }

    #[test]
    fn drain_toasts__should_deliver_rows_written_without_offset_or_known_variant() {
        // Given
        let store = NotificationStore::in_memory().expect("store");
        let user = UserId::from("u1");
        {
            let conn = store.lock().expect("lock");
            conn.execute(
                "INSERT INTO toast_notifications
                    (user_id, message, variant, context_json, created_at)
                 VALUES ('u1', 'legacy', 'info', '{}', '2025-11-17T10:00:00'),
                        ('u1', 'shouting', 'shout', NULL, '2025-11-17T10:00:01.250000'),
                        ('u1', 'garbled', 'success', NULL, 'yesterday')",
                [],
            )
            .expect("insert legacy rows");
        }
        store
            .enqueue_toast(&user, "current", ToastVariant::Error, ToastContext::new())
            .expect("enqueue");

        // When
        let drained = store.drain_toasts(&user).expect("drain");
        let again = store.drain_toasts(&user).expect("second drain");

        // Then
        let messages: Vec<_> = drained.iter().map(|entry| entry.message.as_str()).collect();
        assert_eq!(messages, ["legacy", "shouting", "garbled", "current"]);
        let legacy_at = time::Date::from_calendar_date(2025, time::Month::November, 17)
            .expect("date")
            .with_hms(10, 0, 0)
            .expect("time")
            .assume_utc();
        assert_eq!(drained[0].created_at, legacy_at);
        assert_eq!(drained[1].variant, ToastVariant::Info);
        assert_eq!(drained[1].created_at.second(), 1);
        assert_eq!(drained[2].variant, ToastVariant::Success);
        assert_eq!(drained[2].created_at, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(drained[3].variant, ToastVariant::Error);
        assert!(again.is_empty());
    }

    #[test]
    fn drain_toasts__should_hand_each_toast_to_exactly_one_concurrent_reader() {
        // Given
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(NotificationStore::open(dir.path().join("toasts.db")).expect("open"));
        let user = UserId::from("u1");
        let writer = {
            let store = Arc::clone(&store);
            let user = user.clone();
            std::thread::spawn(move || {
                for n in 0..50 {
                    let message = format!("toast {n}");
                    store
                        .enqueue_toast(&user, &message, ToastVariant::Info, ToastContext::new())
                        .expect("enqueue");
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let user = user.clone();
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    for _ in 0..20 {
                        seen.extend(store.drain_toasts(&user).expect("drain"));
                    }
                    seen
                })
            })
            .collect();

        // When
        writer.join().expect("writer");
        let mut seen: Vec<ToastEntry> = readers
            .into_iter()
            .flat_map(|reader| reader.join().expect("reader"))
            .collect();
        seen.extend(store.drain_toasts(&user).expect("final drain"));

        // Then
        let mut ids: Vec<_> = seen.iter().map(|entry| entry.id).collect();
        assert_eq!(ids.len(), 50);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
