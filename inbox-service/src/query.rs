use inbox_core::{InboxResult, InboxStore, Message, NotificationType, Preference};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing;

use crate::provisioner::PreferenceProvisioner;

/// Notification types a user currently lets into their inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedTypes(BTreeSet<NotificationType>);

impl AllowedTypes {
    pub fn from_preferences(preferences: &[Preference]) -> Self {
        AllowedTypes(
            preferences
                .iter()
                .filter(|p| p.enabled)
                .map(|p| p.message_type.clone())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, message_type: &NotificationType) -> bool {
        self.0.contains(message_type)
    }

    /// Values for the store's type filter. An empty set yields the
    /// unmatchable sentinel so that "nothing allowed" never degrades into
    /// an unfiltered query.
    pub fn filter_values(&self) -> Vec<NotificationType> {
        if self.0.is_empty() {
            return vec![NotificationType::unmatchable()];
        }
        self.0.iter().cloned().collect()
    }
}

/// Preferences and the messages they admit, read as one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct InboxView {
    pub preferences: Vec<Preference>,
    pub messages: Vec<Message>,
}

#[derive(Clone)]
pub struct InboxQuery {
    store: Arc<dyn InboxStore>,
    provisioner: PreferenceProvisioner,
}

impl InboxQuery {
    pub fn new(store: Arc<dyn InboxStore>, provisioner: PreferenceProvisioner) -> Self {
        Self { store, provisioner }
    }

    pub async fn get_inbox(&self, user_id: &str, recipient_email: &str) -> InboxResult<Vec<Message>> {
        Ok(self.load(user_id, recipient_email).await?.messages)
    }

    pub async fn load(&self, user_id: &str, recipient_email: &str) -> InboxResult<InboxView> {
        let preferences = self.provisioner.ensure_preferences(user_id).await?;
        let messages = self.messages_for(recipient_email, &preferences).await?;

        Ok(InboxView { preferences, messages })
    }

    async fn messages_for(
        &self,
        recipient_email: &str,
        preferences: &[Preference],
    ) -> InboxResult<Vec<Message>> {
        let allowed = AllowedTypes::from_preferences(preferences);
        tracing::debug!(
            "Fetching inbox for {} with {} allowed types",
            recipient_email,
            allowed.0.len()
        );

        self.store
            .find_messages(recipient_email, &allowed.filter_values())
            .await
    }
}
