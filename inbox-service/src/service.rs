use inbox_core::{InboxContext, InboxResult, InboxStore, Message, Preference};
use std::sync::Arc;

use crate::provisioner::PreferenceProvisioner;
use crate::query::{InboxQuery, InboxView};
use crate::updater::PreferenceUpdater;

/// Entry point for callers: provisioning, inbox reads and preference toggles
/// over one record store.
#[derive(Clone)]
pub struct InboxService {
    provisioner: PreferenceProvisioner,
    query: InboxQuery,
    updater: PreferenceUpdater,
}

impl InboxService {
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        let provisioner = PreferenceProvisioner::new(store.clone());
        Self {
            query: InboxQuery::new(store.clone(), provisioner.clone()),
            updater: PreferenceUpdater::new(store),
            provisioner,
        }
    }

    pub fn from_context(ctx: &InboxContext) -> Self {
        Self::new(ctx.store.clone())
    }

    pub async fn ensure_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>> {
        self.provisioner.ensure_preferences(user_id).await
    }

    pub async fn get_inbox(&self, user_id: &str, recipient_email: &str) -> InboxResult<Vec<Message>> {
        self.query.get_inbox(user_id, recipient_email).await
    }

    pub async fn load_inbox(&self, user_id: &str, recipient_email: &str) -> InboxResult<InboxView> {
        self.query.load(user_id, recipient_email).await
    }

    pub async fn set_preference(
        &self,
        user_id: &str,
        preference_id: i64,
        enabled: bool,
    ) -> InboxResult<Preference> {
        self.updater.set_preference(user_id, preference_id, enabled).await
    }
}
