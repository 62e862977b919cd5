//! Order handlers: checkout, my-orders, returns, and the admin order desk.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::models::{
    Order, OrderLine, OrderWithLines, PlaceOrderRequest, PlaceOrderResponse,
    ReturnDecisionRequest, ReturnRequestPayload, ReturnStatus, UpdateOrderStatusRequest,
};
use crate::services::notification::OrderSummary;
use crate::utils::error::ApiError;
use crate::AppState;

async fn lines_for_order(
    pool: &sqlx::PgPool,
    order_id: Uuid,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY position")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

/// POST /orders
///
/// Checkout. Referral attribution happens inside the commission service;
/// notifications are spawned after the order is durable and never affect
/// the response.
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, ApiError> {
    req.validate()?;
    req.address.validate()?;
    for item in &req.items {
        item.validate()?;
    }

    let order_id = state
        .commission_service
        .place_order(auth_user.user_id, &req)
        .await?;

    let buyer_email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
        .bind(auth_user.user_id)
        .fetch_optional(&state.db.pool)
        .await
        .unwrap_or(None);

    let summary = OrderSummary {
        order_id,
        item_count: req.items.len(),
        final_amount: req.final_amount,
        payment_method: req.payment_method.clone(),
    };

    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        let buyer = buyer_email.unwrap_or_else(|| "unknown".to_string());
        if buyer != "unknown" {
            notifier.send_order_confirmation(&buyer, &summary).await;
        }
        notifier.send_admin_order_alert(&buyer, &summary).await;
    });

    Ok(Json(PlaceOrderResponse { order_id }))
}

/// GET /orders/my
pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<OrderWithLines>>, ApiError> {
    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(auth_user.user_id)
            .fetch_all(&state.db.pool)
            .await?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = lines_for_order(&state.db.pool, order.id).await?;
        result.push(OrderWithLines { order, lines });
    }

    Ok(Json(result))
}

/// POST /orders/:order_id/lines/:line_index/return
pub async fn request_return(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path((order_id, line_index)): Path<(Uuid, i32)>,
    Json(payload): Json<ReturnRequestPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload.validate()?;

    state
        .commission_service
        .request_return(auth_user.user_id, order_id, line_index, &payload)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Return request saved successfully"
    })))
}

#[derive(Debug, Serialize)]
pub struct AdminOrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub user_name: String,
    pub user_email: String,
    pub lines: Vec<OrderLine>,
}

async fn admin_orders_since(
    state: &AppState,
    since: Option<DateTime<Utc>>,
    returns_only: bool,
) -> Result<Vec<AdminOrderRow>, ApiError> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
        SELECT o.* FROM orders o
        WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
          AND (NOT $2 OR EXISTS (
              SELECT 1 FROM order_lines l
              WHERE l.order_id = o.id AND l.return_requested
          ))
        ORDER BY o.created_at DESC
        "#,
    )
    .bind(since)
    .bind(returns_only)
    .fetch_all(&state.db.pool)
    .await?;

    let mut rows = Vec::with_capacity(orders.len());
    for order in orders {
        let (user_name, user_email): (String, String) =
            sqlx::query_as("SELECT name, email FROM users WHERE id = $1")
                .bind(order.user_id)
                .fetch_optional(&state.db.pool)
                .await?
                .unwrap_or_default();

        let mut lines = lines_for_order(&state.db.pool, order.id).await?;
        if returns_only {
            lines.retain(|l| l.return_requested);
        }

        rows.push(AdminOrderRow {
            order,
            user_name,
            user_email,
            lines,
        });
    }

    Ok(rows)
}

/// GET /admin/orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminOrderRow>>, ApiError> {
    Ok(Json(admin_orders_since(&state, None, false).await?))
}

/// GET /admin/orders/last48h
pub async fn last48h_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminOrderRow>>, ApiError> {
    let since = Utc::now() - chrono::Duration::hours(48);
    Ok(Json(admin_orders_since(&state, Some(since), false).await?))
}

/// GET /admin/orders/returns
pub async fn list_returns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminOrderRow>>, ApiError> {
    Ok(Json(admin_orders_since(&state, None, true).await?))
}

/// GET /admin/orders/last48h/returns
pub async fn last48h_returns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminOrderRow>>, ApiError> {
    let since = Utc::now() - chrono::Duration::hours(48);
    Ok(Json(admin_orders_since(&state, Some(since), true).await?))
}

/// PUT /admin/orders/:order_id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders
        SET status = $1, delivery_date = COALESCE($2, delivery_date)
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(req.status)
    .bind(req.delivery_date)
    .bind(order_id)
    .fetch_optional(&state.db.pool)
    .await?;

    order
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))
}

/// PUT /admin/orders/:order_id/lines/:line_index/return
pub async fn decide_return(
    State(state): State<Arc<AppState>>,
    Path((order_id, line_index)): Path<(Uuid, i32)>,
    Json(req): Json<ReturnDecisionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = if req.approved {
        ReturnStatus::Approved
    } else {
        ReturnStatus::Rejected
    };

    let result = sqlx::query(
        r#"
        UPDATE order_lines
        SET return_status = $1
        WHERE order_id = $2 AND position = $3 AND return_requested
        "#,
    )
    .bind(status)
    .bind(order_id)
    .bind(line_index)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "No return request on that order line".to_string(),
        ));
    }

    Ok(Json(serde_json::json!({
        "message": "Return status updated successfully"
    })))
}
