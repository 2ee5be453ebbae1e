use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use inbox_core::{
    InboxError, InboxResult, InboxStore, MemoryInboxStore, Message, NewMessage, NewPreference,
    NotificationType, Preference,
};
use tokio::sync::Mutex;

pub fn message_at(recipient: &str, message_type: NotificationType, at: i64) -> NewMessage {
    NewMessage {
        sender_domain: "shop.example.com".to_string(),
        recipient_email: recipient.to_string(),
        message_type,
        payload: serde_json::json!({ "status": "confirmed" }),
        created_at: Utc.timestamp_opt(at, 0).unwrap(),
    }
}

/// Every call fails as if the database were down.
pub struct UnavailableStore;

fn unavailable<T>() -> InboxResult<T> {
    Err(InboxError::StoreUnavailable("connection refused".to_string()))
}

#[async_trait]
impl InboxStore for UnavailableStore {
    async fn find_preferences(&self, _user_id: &str) -> InboxResult<Vec<Preference>> {
        unavailable()
    }

    async fn find_preference(&self, _preference_id: i64) -> InboxResult<Option<Preference>> {
        unavailable()
    }

    async fn create_preferences(&self, _batch: &[NewPreference]) -> InboxResult<Vec<Preference>> {
        unavailable()
    }

    async fn update_preference_enabled(&self, _id: i64, _enabled: bool) -> InboxResult<Preference> {
        unavailable()
    }

    async fn find_messages(
        &self,
        _recipient_email: &str,
        _types: &[NotificationType],
    ) -> InboxResult<Vec<Message>> {
        unavailable()
    }
}

/// Simulates another instance provisioning the same user between our
/// read and our batch insert.
pub struct ConflictingStore {
    pub inner: MemoryInboxStore,
    reject: bool,
}

impl ConflictingStore {
    /// Conflicting rows are silently skipped, like `ON CONFLICT DO NOTHING`.
    pub fn skipping() -> Self {
        Self { inner: MemoryInboxStore::new(), reject: false }
    }

    /// Conflicting rows fail the batch with a unique violation.
    pub fn rejecting() -> Self {
        Self { inner: MemoryInboxStore::new(), reject: true }
    }
}

#[async_trait]
impl InboxStore for ConflictingStore {
    async fn find_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>> {
        self.inner.find_preferences(user_id).await
    }

    async fn find_preference(&self, preference_id: i64) -> InboxResult<Option<Preference>> {
        self.inner.find_preference(preference_id).await
    }

    async fn create_preferences(&self, batch: &[NewPreference]) -> InboxResult<Vec<Preference>> {
        self.inner.create_preferences(batch).await?;
        if self.reject {
            return Err(InboxError::ConstraintViolation(
                "duplicate key value violates unique constraint \"preferences_user_type_unique\""
                    .to_string(),
            ));
        }
        self.inner.create_preferences(batch).await
    }

    async fn update_preference_enabled(&self, id: i64, enabled: bool) -> InboxResult<Preference> {
        self.inner.update_preference_enabled(id, enabled).await
    }

    async fn find_messages(
        &self,
        recipient_email: &str,
        types: &[NotificationType],
    ) -> InboxResult<Vec<Message>> {
        self.inner.find_messages(recipient_email, types).await
    }
}

/// Records the type filter of every message lookup.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryInboxStore,
    pub type_filters: Mutex<Vec<Vec<NotificationType>>>,
}

#[async_trait]
impl InboxStore for RecordingStore {
    async fn find_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>> {
        self.inner.find_preferences(user_id).await
    }

    async fn find_preference(&self, preference_id: i64) -> InboxResult<Option<Preference>> {
        self.inner.find_preference(preference_id).await
    }

    async fn create_preferences(&self, batch: &[NewPreference]) -> InboxResult<Vec<Preference>> {
        self.inner.create_preferences(batch).await
    }

    async fn update_preference_enabled(&self, id: i64, enabled: bool) -> InboxResult<Preference> {
        self.inner.update_preference_enabled(id, enabled).await
    }

    async fn find_messages(
        &self,
        recipient_email: &str,
        types: &[NotificationType],
    ) -> InboxResult<Vec<Message>> {
        self.type_filters.lock().await.push(types.to_vec());
        self.inner.find_messages(recipient_email, types).await
    }
}
