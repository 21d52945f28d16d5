use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{OrderLineRequest, PlaceOrderRequest, ShippingAddressRequest},
    dto::payments::CreatePaymentRequest,
    dto::products::UpdateProductRequest,
    entity::{
        categories::ActiveModel as CategoryActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{category_service, order_service, payment_service, product_service},
    state::AppState,
};
use uuid::Uuid;

// Integration flow: place an order with frozen prices, pay it once, then
// exercise the failure paths (double payment, missing product, cascades).
#[tokio::test]
async fn order_and_payment_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
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

    let user_id = create_user(&state, "buyer_one", "buyer@example.com").await?;
    let auth_user = AuthUser {
        user_id,
        roles: vec!["user".to_string()],
        token_id: Uuid::new_v4(),
        token_exp: 0,
    };
    let auth_admin = AuthUser {
        user_id,
        roles: vec!["admin".to_string()],
        token_id: Uuid::new_v4(),
        token_exp: 0,
    };

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set("Snacks".into()),
        description: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let widget = create_product(&state, category.id, "Widget", 999, 10).await?;
    let gadget = create_product(&state, category.id, "Gadget", 500, 5).await?;

    // Place an order: 2 x 9.99 + 1 x 5.00 = 24.98, prices frozen per line.
    let placed = order_service::place_order(
        &state,
        &auth_user,
        PlaceOrderRequest {
            items: vec![
                OrderLineRequest {
                    product_id: widget.id,
                    quantity: 2,
                },
                OrderLineRequest {
                    product_id: gadget.id,
                    quantity: 1,
                },
            ],
            shipping_address: Some(ShippingAddressRequest {
                address_line_1: "1 Main St".into(),
                address_line_2: None,
                city: "Springfield".into(),
                postal_code: "12345".into(),
                country: "US".into(),
            }),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(placed.order.total_price, 2498);
    assert!(!placed.order.is_paid);
    assert_eq!(placed.items.len(), 2);
    let widget_line = placed
        .items
        .iter()
        .find(|i| i.product_id == widget.id)
        .unwrap();
    assert_eq!(widget_line.price, 1998);
    let gadget_line = placed
        .items
        .iter()
        .find(|i| i.product_id == gadget.id)
        .unwrap();
    assert_eq!(gadget_line.price, 500);
    assert!(placed.shipping_address.is_some());

    // A later catalog price change must not reach back into the order.
    product_service::update_product(
        &state,
        &auth_admin,
        widget.id,
        UpdateProductRequest {
            name: None,
            category_id: None,
            description: None,
            price: Some(111),
            image: None,
            stock: None,
            is_available: None,
        },
    )
    .await?;

    let reread = order_service::get_order(&state, &auth_user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(reread.order.total_price, 2498);
    let widget_line = reread
        .items
        .iter()
        .find(|i| i.product_id == widget.id)
        .unwrap();
    assert_eq!(widget_line.price, 1998);

    // An unresolvable product aborts the whole order, nothing partial commits.
    let result = order_service::place_order(
        &state,
        &auth_user,
        PlaceOrderRequest {
            items: vec![
                OrderLineRequest {
                    product_id: widget.id,
                    quantity: 1,
                },
                OrderLineRequest {
                    product_id: Uuid::new_v4(),
                    quantity: 1,
                },
            ],
            shipping_address: None,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound)));

    let order_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(order_count.0, 1);
    let item_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(item_count.0, 2);

    // Pay once.
    let payment = payment_service::create_payment(
        &state,
        &auth_user,
        CreatePaymentRequest {
            order_id: placed.order.id,
            payment_method: "card".into(),
            amount: 2498,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(payment.order_id, placed.order.id);

    let paid = order_service::get_order(&state, &auth_user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert!(paid.order.is_paid);
    assert!(paid.order.payment_date.is_some());

    // Paying again fails and leaves exactly one payment row behind.
    let second = payment_service::create_payment(
        &state,
        &auth_user,
        CreatePaymentRequest {
            order_id: placed.order.id,
            payment_method: "card".into(),
            amount: 2498,
        },
    )
    .await;
    assert!(matches!(second, Err(AppError::InvalidState(_))));

    let payment_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments WHERE order_id = $1")
        .bind(placed.order.id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(payment_count.0, 1);

    // Concurrent payments against one order: exactly one attempt wins.
    let second_order = order_service::place_order(
        &state,
        &auth_user,
        PlaceOrderRequest {
            items: vec![OrderLineRequest {
                product_id: gadget.id,
                quantity: 1,
            }],
            shipping_address: None,
        },
    )
    .await?
    .data
    .unwrap();

    let pay = || {
        payment_service::create_payment(
            &state,
            &auth_user,
            CreatePaymentRequest {
                order_id: second_order.order.id,
                payment_method: "card".into(),
                amount: second_order.order.total_price,
            },
        )
    };
    let (first_attempt, second_attempt) = tokio::join!(pay(), pay());
    assert_eq!(
        first_attempt.is_ok() as u8 + second_attempt.is_ok() as u8,
        1,
        "exactly one concurrent payment may succeed"
    );

    let payment_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments WHERE order_id = $1")
        .bind(second_order.order.id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(payment_count.0, 1);

    // An ordered product cannot be deleted out from under its order items.
    let delete_attempt = product_service::delete_product(&state, &auth_admin, widget.id).await;
    assert!(matches!(delete_attempt, Err(AppError::BadRequest(_))));
    assert!(product_service::get_product(&state, widget.id).await.is_ok());

    // Deleting a category cascades to products without order history.
    let doomed_category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set("Clearance".into()),
        description: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let doomed_product = create_product(&state, doomed_category.id, "Leftover", 100, 1).await?;

    category_service::delete_category(&state, &auth_admin, doomed_category.id).await?;
    let gone = product_service::get_product(&state, doomed_product.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs; roles are reseeded by the migrations.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE payments, shipping_addresses, order_items, orders, cart_items, carts, reviews, user_roles, products, categories, users, revoked_tokens RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_user(state: &AppState, username: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_product(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<storefront_api::models::Product> {
    let model = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        category_id: Set(category_id),
        description: Set(None),
        price: Set(price),
        image: Set(None),
        stock: Set(stock),
        is_available: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let product = product_service::get_product(state, model.id)
        .await?
        .data
        .unwrap();
    Ok(product)
}
