use async_trait::async_trait;

use crate::error::{InboxError, InboxResult};
use crate::types::{Message, NewMessage, NewPreference, NotificationType, Preference, UNMATCHABLE_TYPE};

/// Messages typed with the reserved filter value would leak into inboxes
/// that have every type disabled.
pub(crate) fn ensure_storable(message: &NewMessage) -> InboxResult<()> {
    if message.message_type.is_unmatchable() {
        return Err(InboxError::ConstraintViolation(format!(
            "message type '{}' is reserved",
            UNMATCHABLE_TYPE
        )));
    }
    Ok(())
}

/// Record-store primitives the inbox logic runs on.
///
/// Implementations must enforce uniqueness of `(user_id, message_type)`
/// and skip conflicting rows in `create_preferences` rather than failing
/// the whole batch.
#[async_trait]
pub trait InboxStore: Send + Sync {
    /// All preferences owned by `user_id`, in creation order.
    async fn find_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>>;

    async fn find_preference(&self, preference_id: i64) -> InboxResult<Option<Preference>>;

    /// Inserts the batch and returns the rows actually created.
    async fn create_preferences(&self, batch: &[NewPreference]) -> InboxResult<Vec<Preference>>;

    /// Fails with `NotFound` when no row has `preference_id`.
    async fn update_preference_enabled(
        &self,
        preference_id: i64,
        enabled: bool,
    ) -> InboxResult<Preference>;

    /// Messages for `recipient_email` whose type is in `types`, newest first.
    async fn find_messages(
        &self,
        recipient_email: &str,
        types: &[NotificationType],
    ) -> InboxResult<Vec<Message>>;
}
