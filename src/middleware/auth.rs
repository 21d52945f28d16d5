use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub token_id: Uuid,
    pub token_exp: usize,
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if !user.roles.iter().any(|r| r == role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "admin")
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
            .ok_or(AppError::Unauthenticated)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthenticated)?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthenticated);
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthenticated)?;

        let user_id =
            Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthenticated)?;
        let token_id =
            Uuid::parse_str(&decoded.claims.jti).map_err(|_| AppError::Unauthenticated)?;

        // A logged-out token stays syntactically valid until it expires, so
        // every request checks the persisted revocation store.
        let revoked: Option<(Uuid,)> =
            sqlx::query_as("SELECT token_id FROM revoked_tokens WHERE token_id = $1")
                .bind(token_id)
                .fetch_optional(&state.pool)
                .await?;
        if revoked.is_some() {
            return Err(AppError::Unauthenticated);
        }

        Ok(AuthUser {
            user_id,
            roles: decoded.claims.roles,
            token_id,
            token_exp: decoded.claims.exp,
        })
    }
}
