use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;
use tracing;

use crate::config::DatabaseConfig;
use crate::db::{create_pool, DbConnection, DbPool};
use crate::error::{InboxError, InboxResult};
use crate::schema::{messages, preferences};
use crate::store::{ensure_storable, InboxStore};
use crate::types::{Message, NewMessage, NewPreference, NotificationType, Preference};

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::preferences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct PreferenceRow {
    id: i64,
    user_id: String,
    message_type: String,
    enabled: bool,
}

impl From<PreferenceRow> for Preference {
    fn from(row: PreferenceRow) -> Self {
        Preference {
            id: row.id,
            user_id: row.user_id,
            message_type: NotificationType::from(row.message_type),
            enabled: row.enabled,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::preferences)]
struct NewPreferenceRow<'a> {
    user_id: &'a str,
    message_type: &'a str,
    enabled: bool,
}

impl<'a> From<&'a NewPreference> for NewPreferenceRow<'a> {
    fn from(pref: &'a NewPreference) -> Self {
        NewPreferenceRow {
            user_id: &pref.user_id,
            message_type: pref.message_type.as_str(),
            enabled: pref.enabled,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct MessageRow {
    id: i64,
    sender_domain: String,
    recipient_email: String,
    message_type: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_domain: row.sender_domain,
            recipient_email: row.recipient_email,
            message_type: NotificationType::from(row.message_type),
            payload: row.payload,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::messages)]
struct NewMessageRow<'a> {
    sender_domain: &'a str,
    recipient_email: &'a str,
    message_type: &'a str,
    payload: &'a serde_json::Value,
    created_at: DateTime<Utc>,
}

/// `InboxStore` over the `messages` and `preferences` Postgres tables.
#[derive(Clone)]
pub struct PgInboxStore {
    pool: Arc<DbPool>,
    timeout: Duration,
}

impl PgInboxStore {
    pub fn new(pool: Arc<DbPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool, config.timeout()))
    }

    /// Ingestion is owned elsewhere; this exists for development seeding.
    pub async fn insert_messages(&self, batch: &[NewMessage]) -> InboxResult<Vec<Message>> {
        batch.iter().try_for_each(ensure_storable)?;

        self.timed("insert_messages", async {
            let mut conn = self.conn().await?;
            let rows: Vec<NewMessageRow<'_>> = batch
                .iter()
                .map(|m| NewMessageRow {
                    sender_domain: &m.sender_domain,
                    recipient_email: &m.recipient_email,
                    message_type: m.message_type.as_str(),
                    payload: &m.payload,
                    created_at: m.created_at,
                })
                .collect();

            let inserted: Vec<MessageRow> = diesel::insert_into(messages::table)
                .values(&rows)
                .returning(MessageRow::as_returning())
                .get_results(&mut conn)
                .await?;

            Ok::<_, InboxError>(inserted.into_iter().map(Message::from).collect())
        })
        .await
    }

    async fn conn(&self) -> InboxResult<DbConnection> {
        self.pool
            .get()
            .await
            .map_err(|e| InboxError::StoreUnavailable(format!("Failed to get database connection: {}", e)))
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> InboxResult<T>
    where
        F: Future<Output = InboxResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", operation, self.timeout);
                Err(InboxError::StoreUnavailable(format!(
                    "{} timed out after {:?}",
                    operation, self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl InboxStore for PgInboxStore {
    async fn find_preferences(&self, user_id: &str) -> InboxResult<Vec<Preference>> {
        self.timed("find_preferences", async {
            let mut conn = self.conn().await?;
            let rows: Vec<PreferenceRow> = preferences::table
                .filter(preferences::user_id.eq(user_id))
                .order(preferences::id.asc())
                .select(PreferenceRow::as_select())
                .load(&mut conn)
                .await?;

            Ok::<_, InboxError>(rows.into_iter().map(Preference::from).collect())
        })
        .await
    }

    async fn find_preference(&self, preference_id: i64) -> InboxResult<Option<Preference>> {
        self.timed("find_preference", async {
            let mut conn = self.conn().await?;
            let row: Option<PreferenceRow> = preferences::table
                .filter(preferences::id.eq(preference_id))
                .select(PreferenceRow::as_select())
                .first(&mut conn)
                .await
                .optional()?;

            Ok::<_, InboxError>(row.map(Preference::from))
        })
        .await
    }

    async fn create_preferences(&self, batch: &[NewPreference]) -> InboxResult<Vec<Preference>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        self.timed("create_preferences", async {
            let mut conn = self.conn().await?;
            let rows: Vec<NewPreferenceRow<'_>> = batch.iter().map(NewPreferenceRow::from).collect();

            // Rows that lose a race against a concurrent provision are skipped.
            let created: Vec<PreferenceRow> = diesel::insert_into(preferences::table)
                .values(&rows)
                .on_conflict((preferences::user_id, preferences::message_type))
                .do_nothing()
                .returning(PreferenceRow::as_returning())
                .get_results(&mut conn)
                .await?;

            tracing::debug!("Created {} of {} preferences", created.len(), batch.len());
            Ok::<_, InboxError>(created.into_iter().map(Preference::from).collect())
        })
        .await
    }

    async fn update_preference_enabled(
        &self,
        preference_id: i64,
        enabled: bool,
    ) -> InboxResult<Preference> {
        self.timed("update_preference_enabled", async {
            let mut conn = self.conn().await?;
            let row: Option<PreferenceRow> =
                diesel::update(preferences::table.filter(preferences::id.eq(preference_id)))
                    .set(preferences::enabled.eq(enabled))
                    .returning(PreferenceRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .optional()?;

            row.map(Preference::from).ok_or(InboxError::NotFound(preference_id))
        })
        .await
    }

    async fn find_messages(
        &self,
        recipient_email: &str,
        types: &[NotificationType],
    ) -> InboxResult<Vec<Message>> {
        self.timed("find_messages", async {
            let mut conn = self.conn().await?;
            let type_values: Vec<&str> = types.iter().map(NotificationType::as_str).collect();

            let rows: Vec<MessageRow> = messages::table
                .filter(messages::recipient_email.eq(recipient_email))
                .filter(messages::message_type.eq_any(type_values))
                .order(messages::created_at.desc())
                .select(MessageRow::as_select())
                .load(&mut conn)
                .await?;

            Ok::<_, InboxError>(rows.into_iter().map(Message::from).collect())
        })
        .await
    }
}
