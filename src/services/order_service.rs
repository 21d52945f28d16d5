use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
        shipping_addresses::{
            ActiveModel as ShippingActive, Column as ShippingCol, Entity as ShippingAddresses,
            Model as ShippingModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, ShippingAddress},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    routes::params::SortOrder,
    state::AppState,
};

/// Line prices are frozen at order time in integer minor units, so the sum
/// is exact and later catalog price changes cannot reach back into it.
pub fn line_total(unit_price: i64, quantity: i32) -> i64 {
    unit_price * quantity as i64
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "order must contain at least one item".to_string(),
        ));
    }
    for line in &payload.items {
        if line.quantity < 1 {
            return Err(AppError::BadRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    // Any unresolvable product aborts the whole order; the transaction rolls
    // back on drop and nothing becomes visible.
    let mut lines: Vec<(Uuid, i32, i64)> = Vec::with_capacity(payload.items.len());
    let mut total_price: i64 = 0;
    for line in &payload.items {
        let product = Products::find_by_id(line.product_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let price = line_total(product.price, line.quantity);
        total_price += price;
        lines.push((product.id, line.quantity, price));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_price: Set(total_price),
        is_paid: Set(false),
        payment_date: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for (product_id, quantity, price) in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(price),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    let shipping_address = match payload.shipping_address {
        Some(addr) => {
            let model = ShippingActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                address_line_1: Set(addr.address_line_1),
                address_line_2: Set(addr.address_line_2),
                city: Set(addr.city),
                postal_code: Set(addr.postal_code),
                country: Set(addr.country),
            }
            .insert(&txn)
            .await?;
            Some(shipping_from_entity(model))
        }
        None => None,
    };

    txn.commit().await?;

    tracing::info!(order_id = %order.id, total_price, "order placed");

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items,
            shipping_address,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(paid) = query.paid {
        condition = condition.add(OrderCol::IsPaid.eq(paid));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let shipping_address = ShippingAddresses::find()
        .filter(ShippingCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?
        .map(shipping_from_entity);

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
            shipping_address,
        },
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_price: model.total_price,
        is_paid: model.is_paid,
        payment_date: model.payment_date.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
    }
}

fn shipping_from_entity(model: ShippingModel) -> ShippingAddress {
    ShippingAddress {
        id: model.id,
        order_id: model.order_id,
        address_line_1: model.address_line_1,
        address_line_2: model.address_line_2,
        city: model.city,
        postal_code: model.postal_code,
        country: model.country,
    }
}
