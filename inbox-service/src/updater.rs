use inbox_core::{InboxError, InboxResult, InboxStore, Preference};
use std::sync::Arc;
use tracing;

#[derive(Clone)]
pub struct PreferenceUpdater {
    store: Arc<dyn InboxStore>,
}

impl PreferenceUpdater {
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        Self { store }
    }

    /// Sets `enabled` on a preference owned by `user_id`.
    ///
    /// `user_id` must come from a verified identity. Nothing is written
    /// when the preference is missing or belongs to someone else.
    pub async fn set_preference(
        &self,
        user_id: &str,
        preference_id: i64,
        enabled: bool,
    ) -> InboxResult<Preference> {
        let preference = self
            .store
            .find_preference(preference_id)
            .await?
            .ok_or(InboxError::NotFound(preference_id))?;

        if preference.user_id != user_id {
            tracing::warn!(
                "User {} attempted to modify preference {} owned by another user",
                user_id,
                preference_id
            );
            return Err(InboxError::Unauthorized {
                preference_id,
                user_id: user_id.to_string(),
            });
        }

        let updated = self.store.update_preference_enabled(preference_id, enabled).await?;
        tracing::debug!(
            "Preference {} ({}) for {} set to {}",
            updated.id,
            updated.message_type,
            user_id,
            enabled
        );

        Ok(updated)
    }
}
