use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::payments::CreatePaymentRequest,
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        payments::ActiveModel as PaymentActive,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Payment,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    if payload.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest(
            "payment_method must not be empty".to_string(),
        ));
    }
    if payload.amount < 0 {
        return Err(AppError::BadRequest(
            "amount must not be negative".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let now: DateTimeWithTimeZone = Utc::now().into();

    // The paid flag flips in one conditional update, so of any number of
    // concurrent attempts exactly one can see rows_affected == 1.
    let flipped = Orders::update_many()
        .col_expr(OrderCol::IsPaid, Expr::value(true))
        .col_expr(OrderCol::PaymentDate, Expr::value(now))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::IsPaid.eq(false)),
        )
        .exec(&txn)
        .await?;

    if flipped.rows_affected == 0 {
        let existing = Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::Id.eq(payload.order_id))
                    .add(OrderCol::UserId.eq(user.user_id)),
            )
            .one(&txn)
            .await?;
        return Err(match existing {
            None => AppError::NotFound,
            Some(_) => AppError::InvalidState("order already paid".to_string()),
        });
    }

    // The amount is recorded as supplied; it is not derived from the order
    // total.
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(payload.order_id),
        amount: Set(payload.amount),
        payment_method: Set(payload.payment_method),
        payment_date: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(order_id = %payload.order_id, payment_id = %payment.id, "payment recorded");

    Ok(ApiResponse::success(
        "Payment recorded",
        Payment {
            id: payment.id,
            order_id: payment.order_id,
            amount: payment.amount,
            payment_method: payment.payment_method,
            payment_date: payment.payment_date.with_timezone(&Utc),
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let payment: Option<Payment> = sqlx::query_as(
        r#"
        SELECT p.id, p.order_id, p.amount, p.payment_method, p.payment_date
        FROM payments p
        JOIN orders o ON o.id = p.order_id
        WHERE p.id = $1 AND o.user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    match payment {
        Some(p) => Ok(ApiResponse::success("OK", p, Some(Meta::empty()))),
        None => Err(AppError::NotFound),
    }
}
