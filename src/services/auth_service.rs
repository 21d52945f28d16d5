use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use once_cell::sync::Lazy;
use password_hash::rand_core::OsRng;
use regex::Regex;
use uuid::Uuid;

use crate::{
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").expect("valid regex"));

/// Usernames are 3-20 characters of letters, digits and underscores.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.len() < 3 || username.len() > 20 {
        return Err(AppError::BadRequest(
            "Username must be between 3 and 20 characters".to_string(),
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::BadRequest(
            "Username must contain only letters, numbers, and underscores".to_string(),
        ));
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserResponse>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;

    validate_username(&username)?;

    let mut txn = state.pool.begin().await?;

    let username_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username.as_str())
        .fetch_optional(&mut *txn)
        .await?;
    if username_taken.is_some() {
        return Err(AppError::BadRequest("Username already exists".to_string()));
    }

    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&mut *txn)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let id = Uuid::new_v4();

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(username.as_str())
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(&mut *txn)
    .await?;

    // Every account starts with the base role; admins are promoted via seed.
    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = 'user'",
    )
    .bind(user.id)
    .execute(&mut *txn)
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::success(
        "User created",
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthenticated),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthenticated);
    }

    let roles: Vec<(String,)> = sqlx::query_as(
        "SELECT r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.id WHERE ur.user_id = $1",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        jti: Uuid::new_v4().to_string(),
        roles: roles.into_iter().map(|(name,)| name).collect(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    tracing::info!(user_id = %user.id, "user logged in");

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Revoke the presented token until its natural expiry. The store is shared
/// through the database, so the revocation holds across processes.
pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let expires_at = DateTime::<Utc>::from_timestamp(user.token_exp as i64, 0)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid token expiry")))?;

    // Expired rows can never match a live token again; drop them while here.
    sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
        .execute(&state.pool)
        .await?;

    sqlx::query(
        "INSERT INTO revoked_tokens (token_id, expires_at) VALUES ($1, $2) ON CONFLICT (token_id) DO NOTHING",
    )
    .bind(user.token_id)
    .bind(expires_at)
    .execute(&state.pool)
    .await?;

    tracing::info!(user_id = %user.user_id, "user logged out");

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
