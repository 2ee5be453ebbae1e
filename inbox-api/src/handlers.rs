use axum::{
    extract::{Extension, Path},
    response::Json,
};
use inbox_core::{Message, Preference};
use inbox_service::InboxView;
use serde::{Deserialize, Serialize};
use tracing;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::ApiState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "inbox-api"
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreferenceResponse {
    pub id: i64,
    pub message_type: String,
    pub label: String,
    pub enabled: bool,
}

impl From<&Preference> for PreferenceResponse {
    fn from(pref: &Preference) -> Self {
        PreferenceResponse {
            id: pref.id,
            message_type: pref.message_type.to_string(),
            label: pref.message_type.label().to_string(),
            enabled: pref.enabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub preferences: Vec<PreferenceResponse>,
    pub messages: Vec<Message>,
}

impl From<InboxView> for InboxResponse {
    fn from(view: InboxView) -> Self {
        InboxResponse {
            preferences: view.preferences.iter().map(PreferenceResponse::from).collect(),
            messages: view.messages,
        }
    }
}

pub async fn get_inbox(
    Extension(state): Extension<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<InboxResponse>, ApiError> {
    let view = state.service.load_inbox(&user.user_id, &user.email).await?;
    Ok(Json(InboxResponse::from(view)))
}

pub async fn get_messages(
    Extension(state): Extension<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.service.get_inbox(&user.user_id, &user.email).await?;
    Ok(Json(messages))
}

pub async fn get_preferences(
    Extension(state): Extension<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<PreferenceResponse>>, ApiError> {
    let preferences = state.service.ensure_preferences(&user.user_id).await?;
    Ok(Json(preferences.iter().map(PreferenceResponse::from).collect()))
}

#[derive(Deserialize)]
pub struct UpdatePreferenceRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct UpdatePreferenceResponse {
    pub preference: PreferenceResponse,
    /// `None` when the write committed but the follow-up read failed.
    pub inbox: Option<InboxResponse>,
}

pub async fn update_preference(
    Extension(state): Extension<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePreferenceRequest>,
) -> Result<Json<UpdatePreferenceResponse>, ApiError> {
    let preference_id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid preference id: {}", id)))?;

    let updated = state
        .service
        .set_preference(&user.user_id, preference_id, req.enabled)
        .await?;

    // Clients render from a fresh read rather than patching local state.
    let inbox = match state.service.load_inbox(&user.user_id, &user.email).await {
        Ok(view) => Some(InboxResponse::from(view)),
        Err(e) => {
            tracing::warn!(
                "Preference {} updated but inbox refresh failed: {}",
                preference_id,
                e
            );
            None
        }
    };

    Ok(Json(UpdatePreferenceResponse {
        preference: PreferenceResponse::from(&updated),
        inbox,
    }))
}
