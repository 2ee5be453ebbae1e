pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod memory_store;
pub mod pg_store;
pub mod schema;
pub mod store;
pub mod types;

pub use config::{Config, StoreBackend};
pub use context::InboxContext;
pub use db::DbPool;
pub use error::{InboxError, InboxResult};
pub use memory_store::MemoryInboxStore;
pub use pg_store::PgInboxStore;
pub use store::InboxStore;
pub use types::{Message, NewMessage, NewPreference, NotificationType, Preference, UNMATCHABLE_TYPE};
