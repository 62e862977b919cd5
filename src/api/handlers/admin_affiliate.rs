//! Admin affiliate desk: account listing, attributed orders, withdrawal
//! queue, and per-line earning approval.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    AffiliateOverview, AffiliateTier, EarningActionRequest, Order, OrderWithLines,
    PayoutMethod, SetWithdrawStatusRequest, WithdrawRequestRecord, WithdrawStatus,
};
use crate::services::commission::EarningOutcome;
use crate::utils::error::ApiError;
use crate::AppState;

/// GET /admin/affiliates
///
/// Every account with lifetime withdrawn and total earning derived from the
/// withdrawal ledger.
pub async fn list_affiliates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AffiliateOverview>>, ApiError> {
    type Row = (
        Uuid,
        Uuid,
        String,
        String,
        String,
        i64,
        i64,
        Decimal,
        AffiliateTier,
        Decimal,
        DateTime<Utc>,
    );

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT a.id, a.user_id, u.name, u.email, a.code,
               a.clicks, a.orders, a.commission_earned, a.level,
               COALESCE(w.total, 0) AS withdrawn,
               a.created_at
        FROM affiliates a
        JOIN users u ON u.id = a.user_id
        LEFT JOIN (
            SELECT user_id, SUM(amount) AS total
            FROM withdraw_requests
            GROUP BY user_id
        ) w ON w.user_id = a.user_id
        ORDER BY a.created_at DESC
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    let affiliates = rows
        .into_iter()
        .map(
            |(
                id,
                user_id,
                user_name,
                user_email,
                code,
                clicks,
                orders,
                commission_earned,
                level,
                total_withdrawn,
                created_at,
            )| AffiliateOverview {
                id,
                user_id,
                user_name,
                user_email,
                code,
                clicks,
                orders,
                commission_earned,
                level,
                total_withdrawn,
                total_earning: commission_earned + total_withdrawn,
                created_at,
            },
        )
        .collect();

    Ok(Json(affiliates))
}

#[derive(Debug, Deserialize)]
pub struct RefQuery {
    #[serde(rename = "ref")]
    pub ref_code: Option<String>,
}

/// GET /admin/affiliates/orders?ref=AFF123456
pub async fn affiliate_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefQuery>,
) -> Result<Json<Vec<OrderWithLines>>, ApiError> {
    let Some(code) = query.ref_code.filter(|c| !c.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE ref_code = $1 ORDER BY created_at DESC")
            .bind(&code)
            .fetch_all(&state.db.pool)
            .await?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let lines =
            sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY position")
                .bind(order.id)
                .fetch_all(&state.db.pool)
                .await?;
        result.push(OrderWithLines { order, lines });
    }

    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct AdminWithdrawRow {
    #[serde(flatten)]
    pub request: WithdrawRequestRecord,
    pub user_name: String,
    pub user_email: String,
}

/// GET /admin/withdrawals
pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminWithdrawRow>>, ApiError> {
    type Row = (
        Uuid,
        String,
        Uuid,
        Decimal,
        PayoutMethod,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        WithdrawStatus,
        DateTime<Utc>,
        String,
        String,
    );

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT w.id, w.affiliate_code, w.user_id, w.amount,
               w.payout_method, w.payout_upi,
               w.bank_account_no, w.bank_ifsc, w.bank_holder,
               w.status, w.created_at,
               u.name, u.email
        FROM withdraw_requests w
        JOIN users u ON u.id = w.user_id
        ORDER BY w.created_at DESC
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    let list = rows
        .into_iter()
        .map(
            |(
                id,
                affiliate_code,
                user_id,
                amount,
                payout_method,
                payout_upi,
                bank_account_no,
                bank_ifsc,
                bank_holder,
                status,
                created_at,
                user_name,
                user_email,
            )| AdminWithdrawRow {
                request: WithdrawRequestRecord {
                    id,
                    affiliate_code,
                    user_id,
                    amount,
                    payout_method,
                    payout_upi,
                    bank_account_no,
                    bank_ifsc,
                    bank_holder,
                    status,
                    created_at,
                },
                user_name,
                user_email,
            },
        )
        .collect();

    Ok(Json(list))
}

/// PUT /admin/withdrawals/:id
pub async fn set_withdrawal_status(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<SetWithdrawStatusRequest>,
) -> Result<Json<WithdrawRequestRecord>, ApiError> {
    let record = state
        .withdrawal_service
        .set_status(request_id, req.status)
        .await?;

    tracing::info!(
        "Withdrawal {} set to {:?} by admin",
        request_id,
        record.status
    );
    Ok(Json(record))
}

/// POST /admin/earnings/approve
pub async fn approve_earning(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EarningActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state
        .commission_service
        .approve_earning(req.order_id, req.line_index)
        .await?;

    let body = match outcome {
        EarningOutcome::Applied { amount } => serde_json::json!({
            "message": "Earning approved",
            "amount": amount,
        }),
        EarningOutcome::AlreadyApplied => serde_json::json!({
            "message": "Already approved",
        }),
    };

    Ok(Json(body))
}

/// POST /admin/earnings/reject
pub async fn reject_earning(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EarningActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state
        .commission_service
        .reject_earning(req.order_id, req.line_index)
        .await?;

    let message = match outcome {
        EarningOutcome::Applied { .. } => "Earning rejected",
        EarningOutcome::AlreadyApplied => "Already rejected",
    };

    Ok(Json(serde_json::json!({ "message": message })))
}
