use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::{
    dto::{auth::UserResponse, users::{Profile, UpdateProfileRequest}},
    entity::{
        roles::{self, Entity as Roles},
        user_roles,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, FromQueryResult)]
struct RoleName {
    name: String,
}

pub async fn get_profile(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let roles = Roles::find()
        .join(JoinType::InnerJoin, roles::Relation::UserRoles.def())
        .filter(user_roles::Column::UserId.eq(auth.user_id))
        .select_only()
        .column(roles::Column::Name)
        .into_model::<RoleName>()
        .all(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        Profile {
            user: user_response(user),
            roles: roles.into_iter().map(|r| r.name).collect(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserResponse>> {
    let existing = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(email) = payload.email.as_ref() {
        let taken = Users::find()
            .filter(UserCol::Email.eq(email.as_str()))
            .filter(UserCol::Id.ne(auth.user_id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Email is already taken".to_string()));
        }
    }

    let mut active: UserActive = existing.into();
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(password) = payload.password {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .to_string();
        active.password_hash = Set(password_hash);
    }
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    tracing::info!(user_id = %user.id, "profile updated");

    Ok(ApiResponse::success(
        "Updated",
        user_response(user),
        Some(Meta::empty()),
    ))
}

pub async fn delete_account(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // Settlement records must survive; an account with payments stays.
    let has_payments: Option<(Uuid,)> = sqlx::query_as(
        "SELECT p.id FROM payments p JOIN orders o ON o.id = p.order_id WHERE o.user_id = $1 LIMIT 1",
    )
    .bind(auth.user_id)
    .fetch_optional(&state.pool)
    .await?;
    if has_payments.is_some() {
        return Err(AppError::BadRequest(
            "Account has payment history and cannot be deleted".to_string(),
        ));
    }

    let result = Users::delete_by_id(auth.user_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %auth.user_id, "account deleted");

    Ok(ApiResponse::success(
        "Account deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn user_response(model: UserModel) -> UserResponse {
    UserResponse {
        id: model.id,
        username: model.username,
        email: model.email,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
