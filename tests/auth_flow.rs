use chrono::Utc;
use sea_orm::{ConnectionTrait, Statement};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::{LoginRequest, RegisterRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::auth_service,
    state::AppState,
};
use uuid::Uuid;

#[tokio::test]
async fn register_login_logout_flow() -> anyhow::Result<()> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };
    unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };

    let state = setup_state(&database_url).await?;

    // Too-short usernames never reach the database.
    let rejected = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "ab".into(),
            email: "ab@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    let created = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "valid_user1".into(),
            email: "valid@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.username, "valid_user1");

    // Username and email are each unique.
    let duplicate_username = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "valid_user1".into(),
            email: "other@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await;
    assert!(matches!(duplicate_username, Err(AppError::BadRequest(_))));

    let duplicate_email = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "other_user".into(),
            email: "valid@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await;
    assert!(matches!(duplicate_email, Err(AppError::BadRequest(_))));

    let wrong_password = auth_service::login_user(
        &state,
        LoginRequest {
            email: "valid@example.com".into(),
            password: "not-the-password".into(),
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(AppError::Unauthenticated)));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "valid@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(login.token.starts_with("Bearer "));

    // Logout persists the token id so any process can reject it afterwards.
    let auth = AuthUser {
        user_id: created.id,
        roles: vec!["user".to_string()],
        token_id: Uuid::new_v4(),
        token_exp: (Utc::now().timestamp() + 3600) as usize,
    };
    auth_service::logout_user(&state, &auth).await?;

    let revoked: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM revoked_tokens WHERE token_id = $1")
        .bind(auth.token_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(revoked.0, 1);

    // Logging out twice is harmless.
    auth_service::logout_user(&state, &auth).await?;

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE payments, shipping_addresses, order_items, orders, cart_items, carts, reviews, user_roles, products, categories, users, revoked_tokens RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}
