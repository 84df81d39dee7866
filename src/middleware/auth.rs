use axum::{extract::FromRequestParts, http::header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::{Users, users::Model as UserModel},
    error::{AppError, AppResult},
    state::AppState,
};

/// Identity of the caller, taken from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub fn issue_token(secret: &str, user_id: Uuid, ttl_hours: i64) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(secret: &str, token: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;
    Ok(AuthUser { user_id })
}

/// Loads the caller and requires admin rights.
///
/// Admin status is read from the store on every call so a grant takes effect
/// without the user signing in again.
pub async fn ensure_admin(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !account.is_admin {
        tracing::debug!(user_id = %user.user_id, "admin access denied");
        return Err(AppError::Forbidden);
    }
    Ok(account)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();

        verify_token(&state.config.jwt_secret, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_user_id() {
        let user_id = Uuid::new_v4();
        let token = issue_token("test-secret", user_id, 1).unwrap();
        let user = verify_token("test-secret", &token).unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issue_token("test-secret", Uuid::new_v4(), 1).unwrap();
        let err = verify_token("other-secret", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let token = issue_token("test-secret", Uuid::new_v4(), -2).unwrap();
        assert!(matches!(
            verify_token("test-secret", &token),
            Err(AppError::Unauthorized)
        ));
    }
}
