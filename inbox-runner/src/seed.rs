use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use inbox_core::db::run_migrations;
use inbox_core::{Config, NewMessage, NotificationType, PgInboxStore, StoreBackend};
use serde_json::json;
use tracing;

/// One notification of each known type, oldest first.
pub fn sample_messages(recipient: &str, now: DateTime<Utc>) -> Vec<NewMessage> {
    vec![
        NewMessage {
            sender_domain: "shop.example.com".to_string(),
            recipient_email: recipient.to_string(),
            message_type: NotificationType::Order,
            payload: json!({
                "order_id": "ORD-12345",
                "amount": 99.99,
                "items": [
                    { "name": "Product A", "quantity": 2, "price": 29.99 },
                    { "name": "Product B", "quantity": 1, "price": 40.01 }
                ],
                "status": "confirmed"
            }),
            created_at: now - Duration::seconds(2),
        },
        NewMessage {
            sender_domain: "billing.saas.com".to_string(),
            recipient_email: recipient.to_string(),
            message_type: NotificationType::Invoice,
            payload: json!({
                "invoice_id": "INV-2024-001",
                "amount": 49.00,
                "period": "January 2024",
                "due_date": "2024-02-01",
                "status": "pending"
            }),
            created_at: now - Duration::seconds(1),
        },
        NewMessage {
            sender_domain: "logistics.shipping.com".to_string(),
            recipient_email: recipient.to_string(),
            message_type: NotificationType::Shipping,
            payload: json!({
                "tracking_number": "SHIP-789-XYZ",
                "carrier": "FastShip Express",
                "status": "in_transit",
                "estimated_delivery": "2024-01-25",
                "last_location": "Distribution Center, Amsterdam"
            }),
            created_at: now,
        },
    ]
}

pub async fn run(config: &Config, recipient: &str) -> Result<()> {
    if config.store != StoreBackend::Postgres {
        bail!("Seeding needs a persistent store; set INBOX_STORE=postgres");
    }

    let store = PgInboxStore::connect(&config.database).await?;
    run_migrations(&config.database.url).await?;

    tracing::info!("Inserting sample messages for {}", recipient);
    let inserted = store.insert_messages(&sample_messages(recipient, Utc::now())).await?;
    tracing::info!("Inserted {} messages", inserted.len());

    Ok(())
}
