use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{InboxError, InboxResult};
use crate::store::{ensure_storable, InboxStore};
use crate::types::{Message, NewMessage, NewPreference, NotificationType, Preference};

#[derive(Default)]
struct Tables {
    messages: Vec<Message>,
    preferences: Vec<Preference>,
    next_message_id: i64,
    next_preference_id: i64,
}

/// Process-local `InboxStore` with the same uniqueness rules as the
/// Postgres schema. Used for development runs and tests.
#[derive(Default)]
pub struct MemoryInboxStore {
    tables: RwLock<Tables>,
}

impl MemoryInboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_message(&self, message: NewMessage) -> InboxResult<Message> {
        ensure_storable(&message)?;

        let mut tables = self.tables.write().await;
        tables.next_message_id += 1;
        let stored = Message {
            id: tables.next_message_id,
            sender_domain: message.sender_domain,
            recipient_email: message.recipient_email,
            message_type: message.message_type,
            payload: message.payload,
            created_at: message.created_at,
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    /// All-or-nothing: a reserved type anywhere in the batch inserts nothing.
    pub async fn insert_messages(&self, batch: Vec<NewMessage>) -> InboxResult<Vec<Message>> {
        batch.iter().try_for_each(ensure_storable)?;

        let mut inserted = Vec::with_capacity(batch.len());
        for message in batch {
            inserted.push(self.insert_message(message).await?);
        }
        Ok(inserted)
    }

    pub async fn preference_count(&self) -> usize {
        self.tables.read().await.preferences.len()
    }
}

#[async_trait]
impl InboxStore for MemoryInboxStore {
    async fn find_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>> {
        let tables = self.tables.read().await;
        Ok(tables
            .preferences
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_preference(&self, preference_id: i64) -> InboxResult<Option<Preference>> {
        let tables = self.tables.read().await;
        Ok(tables.preferences.iter().find(|p| p.id == preference_id).cloned())
    }

    async fn create_preferences(&self, batch: &[NewPreference]) -> InboxResult<Vec<Preference>> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::with_capacity(batch.len());

        for pref in batch {
            let exists = tables
                .preferences
                .iter()
                .any(|p| p.user_id == pref.user_id && p.message_type == pref.message_type);
            if exists {
                tracing::debug!(
                    "Skipping existing preference {} for user {}",
                    pref.message_type,
                    pref.user_id
                );
                continue;
            }

            tables.next_preference_id += 1;
            let stored = Preference {
                id: tables.next_preference_id,
                user_id: pref.user_id.clone(),
                message_type: pref.message_type.clone(),
                enabled: pref.enabled,
            };
            tables.preferences.push(stored.clone());
            created.push(stored);
        }

        Ok(created)
    }

    async fn update_preference_enabled(
        &self,
        preference_id: i64,
        enabled: bool,
    ) -> InboxResult<Preference> {
        let mut tables = self.tables.write().await;
        let pref = tables
            .preferences
            .iter_mut()
            .find(|p| p.id == preference_id)
            .ok_or(InboxError::NotFound(preference_id))?;

        pref.enabled = enabled;
        Ok(pref.clone())
    }

    async fn find_messages(
        &self,
        recipient_email: &str,
        types: &[NotificationType],
    ) -> InboxResult<Vec<Message>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.recipient_email == recipient_email && types.contains(&m.message_type))
            .cloned()
            .collect();

        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(recipient: &str, message_type: NotificationType, at: i64) -> NewMessage {
        NewMessage {
            sender_domain: "shop.example.com".to_string(),
            recipient_email: recipient.to_string(),
            message_type,
            payload: serde_json::json!({}),
            created_at: Utc.timestamp_opt(at, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_preferences_skips_duplicate_user_type_pairs() {
        let store = MemoryInboxStore::new();
        let batch = vec![
            NewPreference::enabled("u1", NotificationType::Order),
            NewPreference::enabled("u1", NotificationType::Invoice),
        ];

        let first = store.create_preferences(&batch).await.unwrap();
        let second = store.create_preferences(&batch).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(store.preference_count().await, 2);
    }

    #[tokio::test]
    async fn update_of_missing_preference_is_not_found() {
        let store = MemoryInboxStore::new();

        let err = store.update_preference_enabled(42, false).await.unwrap_err();
        assert!(matches!(err, InboxError::NotFound(42)));
    }

    #[tokio::test]
    async fn find_messages_filters_by_recipient_and_type_newest_first() {
        let store = MemoryInboxStore::new();
        store
            .insert_messages(vec![
                message("a@example.com", NotificationType::Order, 100),
                message("a@example.com", NotificationType::Invoice, 300),
                message("a@example.com", NotificationType::Shipping, 200),
                message("b@example.com", NotificationType::Order, 400),
            ])
            .await
            .unwrap();

        let found = store
            .find_messages(
                "a@example.com",
                &[NotificationType::Order, NotificationType::Shipping],
            )
            .await
            .unwrap();

        let types: Vec<_> = found.iter().map(|m| m.message_type.clone()).collect();
        assert_eq!(types, vec![NotificationType::Shipping, NotificationType::Order]);
    }

    #[tokio::test]
    async fn reserved_filter_type_cannot_be_stored() {
        let store = MemoryInboxStore::new();

        let err = store
            .insert_message(message("a@example.com", NotificationType::from("none"), 100))
            .await
            .unwrap_err();
        assert!(matches!(err, InboxError::ConstraintViolation(_)));

        let batch_err = store
            .insert_messages(vec![
                message("a@example.com", NotificationType::Order, 100),
                message("a@example.com", NotificationType::unmatchable(), 200),
            ])
            .await
            .unwrap_err();
        assert!(matches!(batch_err, InboxError::ConstraintViolation(_)));

        let stored = store
            .find_messages("a@example.com", &[NotificationType::Order, NotificationType::unmatchable()])
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
