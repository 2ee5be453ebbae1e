use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing;

use crate::error::ApiError;
use crate::state::ApiState;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// Identity verified by the auth middleware. Handlers take the user id and
/// email from here only.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

fn extract_token(auth_header: Option<&str>) -> Option<String> {
    auth_header?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn generate_token(
    user_id: &str,
    email: &str,
    secret: &str,
    expires_in_days: u64,
) -> Result<String, ApiError> {
    let exp = i64::try_from(expires_in_days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .and_then(|exp| usize::try_from(exp.timestamp()).ok())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Token lifetime of {} days is out of range", expires_in_days))
        })?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).map_err(|e| {
        tracing::error!("Failed to generate JWT token: {}", e);
        ApiError::Internal("Failed to generate token".to_string())
    })
}

pub fn verify_token(token: &str, secret: &str) -> Result<AuthenticatedUser, ApiError> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());

    match decode::<Claims>(token, &decoding_key, &Validation::default()) {
        Ok(token_data) => Ok(AuthenticatedUser {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        }),
        Err(e) => {
            tracing::debug!("JWT verification failed: {}", e);
            Err(ApiError::Unauthorized("Invalid or expired token".to_string()))
        }
    }
}

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, ApiError> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = extract_token(auth_header).ok_or_else(|| {
        tracing::debug!("Missing Authorization header");
        ApiError::Unauthorized("Missing bearer token".to_string())
    })?;

    let state = req
        .extensions()
        .get::<ApiState>()
        .ok_or_else(|| ApiError::Internal("API state missing from request".to_string()))?;

    let user = verify_token(&token, &state.ctx.config.server.jwt_secret)?;
    tracing::debug!("Authenticated user: {}", user.user_id);

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
