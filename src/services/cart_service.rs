use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartItemDto, CartResponse, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct CartLineRow {
    line_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    category_id: Uuid,
    description: Option<String>,
    price: i64,
    image: Option<String>,
    stock: i32,
    is_available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartResponse>> {
    let cart = ensure_cart(state, user.user_id).await?;

    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id AS line_id, ci.quantity,
               p.id AS product_id, p.name, p.category_id, p.description, p.price,
               p.image, p.stock, p.is_available, p.created_at, p.updated_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(cart.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .fetch_one(&state.pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.line_id,
            product: Product {
                id: row.product_id,
                name: row.name,
                category_id: row.category_id,
                description: row.description,
                price: row.price,
                image: row.image,
                stock: row.stock,
                is_available: row.is_available,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            quantity: row.quantity,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        CartResponse {
            id: cart.id,
            items,
        },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::NotFound);
    }

    let cart = ensure_cart(state, user.user_id).await?;

    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart.id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    tracing::debug!(user_id = %user.user_id, product_id = %payload.product_id, "cart updated");

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let updated: Option<CartItem> = sqlx::query_as(
        r#"
        UPDATE cart_items ci
        SET quantity = $3
        FROM carts c
        WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
        RETURNING ci.*
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?;

    match updated {
        Some(item) => Ok(ApiResponse::success("OK", item, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items
        USING carts
        WHERE cart_items.cart_id = carts.id
          AND carts.user_id = $1
          AND cart_items.product_id = $2
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Checkout never touches the cart, so this is the only way to empty it.
pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query(
        r#"
        DELETE FROM cart_items
        USING carts
        WHERE cart_items.cart_id = carts.id AND carts.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .execute(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Each user owns exactly one cart, created on first use. The insert is
/// race-safe: the loser of a concurrent first request reads the winner's row.
async fn ensure_cart(state: &AppState, user_id: Uuid) -> AppResult<Cart> {
    let existing: Option<Cart> = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;
    if let Some(cart) = existing {
        return Ok(cart);
    }

    let inserted: Option<Cart> = sqlx::query_as(
        "INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?;

    match inserted {
        Some(cart) => Ok(cart),
        None => {
            let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&state.pool)
                .await?;
            Ok(cart)
        }
    }
}
