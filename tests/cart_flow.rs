use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    dto::reviews::CreateReviewRequest,
    entity::{
        categories::ActiveModel as CategoryActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::{cart_service, review_service},
    state::AppState,
};
use uuid::Uuid;

#[tokio::test]
async fn cart_and_review_flow() -> anyhow::Result<()> {
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

    let state = setup_state(&database_url).await?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set("shopper".into()),
        email: Set("shopper@example.com".into()),
        password_hash: Set("dummy".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let auth = AuthUser {
        user_id: user.id,
        roles: vec!["user".to_string()],
        token_id: Uuid::new_v4(),
        token_exp: 0,
    };

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set("Pantry".into()),
        description: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Olive Oil".into()),
        category_id: Set(category.id),
        description: Set(None),
        price: Set(1250),
        image: Set(None),
        stock: Set(30),
        is_available: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // The cart springs into existence on first touch.
    let cart = cart_service::get_cart(&state, &auth, page_one())
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());

    // Unknown products cannot be added.
    let missing = cart_service::add_to_cart(
        &state,
        &auth,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    // Adding the same product twice keeps one line with the latest quantity.
    cart_service::add_to_cart(
        &state,
        &auth,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;
    let line = cart_service::add_to_cart(
        &state,
        &auth,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(line.quantity, 3);

    let cart = cart_service::get_cart(&state, &auth, page_one())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    // The cart reflects the live catalog price.
    assert_eq!(cart.items[0].product.price, 1250);

    let updated = cart_service::update_cart_item(
        &state,
        &auth,
        product.id,
        UpdateCartItemRequest { quantity: 5 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.quantity, 5);

    cart_service::remove_from_cart(&state, &auth, product.id).await?;
    let removed_again = cart_service::remove_from_cart(&state, &auth, product.id).await;
    assert!(matches!(removed_again, Err(AppError::NotFound)));

    cart_service::add_to_cart(
        &state,
        &auth,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    cart_service::clear_cart(&state, &auth).await?;
    let cart = cart_service::get_cart(&state, &auth, page_one())
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());

    // Reviews: bounded rating, product must exist, owner can delete.
    let bad_rating = review_service::create_review(
        &state,
        &auth,
        CreateReviewRequest {
            product_id: product.id,
            rating: 6,
            comment: None,
        },
    )
    .await;
    assert!(matches!(bad_rating, Err(AppError::BadRequest(_))));

    let review = review_service::create_review(
        &state,
        &auth,
        CreateReviewRequest {
            product_id: product.id,
            rating: 4,
            comment: Some("Fruity".into()),
        },
    )
    .await?
    .data
    .unwrap();

    let listed = review_service::list_product_reviews(&state, product.id, page_one())
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].rating, 4);

    review_service::delete_review(&state, &auth, review.id).await?;
    let listed = review_service::list_product_reviews(&state, product.id, page_one())
        .await?
        .data
        .unwrap();
    assert!(listed.items.is_empty());

    Ok(())
}

fn page_one() -> Pagination {
    Pagination {
        page: Some(1),
        per_page: Some(20),
    }
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
