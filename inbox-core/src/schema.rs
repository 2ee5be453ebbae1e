use diesel::{table, allow_tables_to_appear_in_same_query};

table! {
    messages (id) {
        id -> BigInt,
        sender_domain -> Text,
        recipient_email -> Text,
        #[sql_name = "type"]
        message_type -> Text,
        payload -> Jsonb,
        created_at -> Timestamptz,
    }
}

table! {
    preferences (id) {
        id -> BigInt,
        user_id -> Text,
        message_type -> Text,
        enabled -> Bool,
    }
}

allow_tables_to_appear_in_same_query!(
    messages,
    preferences,
);
