use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

/// Reserved type value used as an always-empty message filter. Stores refuse
/// to persist messages carrying it.
pub const UNMATCHABLE_TYPE: &str = "none";

/// Category of a notification. Governs payload shape (opaque here) and
/// preference gating.
///
/// Values outside the known set are kept verbatim as `Other` so rows
/// written by newer senders still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    Order,
    Invoice,
    Shipping,
    Other(String),
}

impl NotificationType {
    /// Types that get a default preference on first access.
    pub const KNOWN: [NotificationType; 3] = [
        NotificationType::Order,
        NotificationType::Invoice,
        NotificationType::Shipping,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::Order => "order",
            NotificationType::Invoice => "invoice",
            NotificationType::Shipping => "shipping",
            NotificationType::Other(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NotificationType::Order => "Order Confirmations",
            NotificationType::Invoice => "Invoices",
            NotificationType::Shipping => "Shipping Updates",
            NotificationType::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NotificationType::Other(_))
    }

    pub fn unmatchable() -> Self {
        NotificationType::Other(UNMATCHABLE_TYPE.to_string())
    }

    pub fn is_unmatchable(&self) -> bool {
        self.as_str() == UNMATCHABLE_TYPE
    }
}

impl From<&str> for NotificationType {
    fn from(value: &str) -> Self {
        match value {
            "order" => NotificationType::Order,
            "invoice" => NotificationType::Invoice,
            "shipping" => NotificationType::Shipping,
            other => NotificationType::Other(other.to_string()),
        }
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "order" | "invoice" | "shipping" => NotificationType::from(value.as_str()),
            _ => NotificationType::Other(value),
        }
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        match value {
            NotificationType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_domain: String,
    pub recipient_email: String,
    #[serde(rename = "type")]
    pub message_type: NotificationType,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_domain: String,
    pub recipient_email: String,
    #[serde(rename = "type")]
    pub message_type: NotificationType,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub id: i64,
    pub user_id: String,
    pub message_type: NotificationType,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPreference {
    pub user_id: String,
    pub message_type: NotificationType,
    pub enabled: bool,
}

impl NewPreference {
    /// Opted-in preference, the state every provisioned type starts in.
    pub fn enabled(user_id: &str, message_type: NotificationType) -> Self {
        Self {
            user_id: user_id.to_string(),
            message_type,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_parse_from_their_wire_names() {
        for known in NotificationType::KNOWN {
            assert_eq!(NotificationType::from(known.as_str()), known);
            assert_eq!(NotificationType::from(known.as_str().to_string()), known);
            assert!(known.is_known());
        }
    }

    #[test]
    fn unrecognized_type_is_preserved() {
        let parsed = NotificationType::from("refund");
        assert_eq!(parsed, NotificationType::Other("refund".to_string()));
        assert!(!parsed.is_known());
        assert_eq!(parsed.label(), "refund");
        assert_eq!(String::from(parsed), "refund");
    }

    #[test]
    fn reserved_filter_type_is_recognized() {
        assert!(NotificationType::from("none").is_unmatchable());
        assert!(NotificationType::unmatchable().is_unmatchable());
        for known in NotificationType::KNOWN {
            assert!(!known.is_unmatchable());
        }
    }

    #[test]
    fn labels_match_preference_panel_copy() {
        assert_eq!(NotificationType::Order.label(), "Order Confirmations");
        assert_eq!(NotificationType::Invoice.label(), "Invoices");
        assert_eq!(NotificationType::Shipping.label(), "Shipping Updates");
    }

    #[test]
    fn message_serializes_type_under_wire_name() {
        let message = Message {
            id: 7,
            sender_domain: "shop.example.com".to_string(),
            recipient_email: "test@example.com".to_string(),
            message_type: NotificationType::Order,
            payload: serde_json::json!({ "order_id": "ORD-12345" }),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "order");
        assert_eq!(json["payload"]["order_id"], "ORD-12345");
        assert!(json.get("message_type").is_none());
    }
}
