use inbox_core::{InboxError, InboxResult, InboxStore, NewPreference, NotificationType, Preference};
use std::sync::Arc;
use tracing;

/// Gives a user one preference per known notification type on first access.
///
/// Users who already have any preference are returned as-is; types added
/// after their first visit are not backfilled.
#[derive(Clone)]
pub struct PreferenceProvisioner {
    store: Arc<dyn InboxStore>,
}

impl PreferenceProvisioner {
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        Self { store }
    }

    pub async fn ensure_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>> {
        let existing = self.store.find_preferences(user_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let defaults: Vec<NewPreference> = NotificationType::KNOWN
            .into_iter()
            .map(|message_type| NewPreference::enabled(user_id, message_type))
            .collect();

        match self.store.create_preferences(&defaults).await {
            Ok(created) if created.len() == defaults.len() => {
                tracing::info!("Provisioned {} default preferences for {}", created.len(), user_id);
                Ok(created)
            }
            Ok(created) => {
                tracing::warn!(
                    "Concurrent provisioning for {}: created {} of {} defaults, re-reading",
                    user_id,
                    created.len(),
                    defaults.len()
                );
                self.store.find_preferences(user_id).await
            }
            Err(InboxError::ConstraintViolation(detail)) => {
                tracing::warn!("Concurrent provisioning for {}: {}, re-reading", user_id, detail);
                self.store.find_preferences(user_id).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ConflictingStore, UnavailableStore};
    use inbox_core::MemoryInboxStore;

    #[tokio::test]
    async fn first_access_creates_one_enabled_preference_per_known_type() {
        let store = Arc::new(MemoryInboxStore::new());
        let provisioner = PreferenceProvisioner::new(store.clone());

        let prefs = provisioner.ensure_preferences("u1").await.unwrap();

        assert_eq!(prefs.len(), NotificationType::KNOWN.len());
        for known in NotificationType::KNOWN {
            let matching: Vec<_> = prefs.iter().filter(|p| p.message_type == known).collect();
            assert_eq!(matching.len(), 1, "expected exactly one {} preference", known);
            assert!(matching[0].enabled);
            assert_eq!(matching[0].user_id, "u1");
        }
        assert_eq!(store.preference_count().await, 3);
    }

    #[tokio::test]
    async fn second_access_returns_the_same_rows() {
        let store = Arc::new(MemoryInboxStore::new());
        let provisioner = PreferenceProvisioner::new(store.clone());

        let first = provisioner.ensure_preferences("u1").await.unwrap();
        let second = provisioner.ensure_preferences("u1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.preference_count().await, 3);
    }

    #[tokio::test]
    async fn existing_partial_set_is_not_backfilled() {
        let store = Arc::new(MemoryInboxStore::new());
        store
            .create_preferences(&[NewPreference {
                user_id: "u1".to_string(),
                message_type: NotificationType::Order,
                enabled: false,
            }])
            .await
            .unwrap();
        let provisioner = PreferenceProvisioner::new(store.clone());

        let prefs = provisioner.ensure_preferences("u1").await.unwrap();

        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].message_type, NotificationType::Order);
        assert!(!prefs[0].enabled);
        assert_eq!(store.preference_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_provision_that_wins_the_race_is_absorbed() {
        let store = Arc::new(ConflictingStore::skipping());
        let provisioner = PreferenceProvisioner::new(store.clone());

        let prefs = provisioner.ensure_preferences("u1").await.unwrap();

        assert_eq!(prefs.len(), 3);
        assert_eq!(store.inner.preference_count().await, 3);
    }

    #[tokio::test]
    async fn constraint_violation_on_provision_is_absorbed() {
        let store = Arc::new(ConflictingStore::rejecting());
        let provisioner = PreferenceProvisioner::new(store.clone());

        let prefs = provisioner.ensure_preferences("u1").await.unwrap();

        assert_eq!(prefs.len(), 3);
        assert!(prefs.iter().all(|p| p.user_id == "u1"));
    }

    #[tokio::test]
    async fn store_outage_is_surfaced() {
        let provisioner = PreferenceProvisioner::new(Arc::new(UnavailableStore));

        let err = provisioner.ensure_preferences("u1").await.unwrap_err();
        assert!(matches!(err, InboxError::StoreUnavailable(_)));
    }
}
