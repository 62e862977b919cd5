//! Affiliate program handlers
//!
//! Account activation and profile, payout details, click tracking (public),
//! withdrawal flow, and the affiliate-facing analytics.

use axum::{
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::models::{
    ActivateResponse, Affiliate, AffiliateAnalytics, AffiliateProfile, CityCount, DeviceStats,
    EarningsByDay, Order, OrderWithLines, PaymentMethodRequest, PayoutMethod, ProductCount,
    RecordClickRequest, RecordClickResponse, WithdrawRequestRecord, WithdrawResponse,
};
use crate::services::click::ClickOutcome;
use crate::utils::error::ApiError;
use crate::AppState;

/// Opaque, shareable account code.
fn generate_affiliate_code() -> String {
    let digits: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    format!("AFF{}", digits)
}

async fn affiliate_for_user(
    pool: &sqlx::PgPool,
    user_id: Uuid,
) -> Result<Option<Affiliate>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM affiliates WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// POST /affiliate/activate
///
/// Explicit opt-in; re-activation reports the existing code instead of
/// failing.
pub async fn activate(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ActivateResponse>, ApiError> {
    if let Some(existing) = affiliate_for_user(&state.db.pool, auth_user.user_id).await? {
        return Ok(Json(ActivateResponse {
            message: "Affiliate already active".to_string(),
            code: existing.code,
        }));
    }

    let code = generate_affiliate_code();

    sqlx::query("INSERT INTO affiliates (user_id, code) VALUES ($1, $2)")
        .bind(auth_user.user_id)
        .bind(&code)
        .execute(&state.db.pool)
        .await?;

    tracing::info!("Affiliate activated: {} for user {}", code, auth_user.user_id);

    Ok(Json(ActivateResponse {
        message: "Affiliate activated".to_string(),
        code,
    }))
}

/// POST /affiliate/payment-method
pub async fn save_payment_method(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<PaymentMethodRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    match req.method {
        PayoutMethod::Upi if req.upi.is_none() => {
            return Err(ApiError::InvalidInput(
                "UPI id required for UPI payouts".to_string(),
            ));
        }
        PayoutMethod::Bank if req.bank.is_none() => {
            return Err(ApiError::InvalidInput(
                "Bank details required for bank payouts".to_string(),
            ));
        }
        _ => {}
    }

    let bank = req.bank.as_ref();
    let result = sqlx::query(
        r#"
        UPDATE affiliates
        SET payout_method = $1,
            payout_upi = $2,
            bank_account_no = $3,
            bank_ifsc = $4,
            bank_holder = $5
        WHERE user_id = $6
        "#,
    )
    .bind(req.method)
    .bind(&req.upi)
    .bind(bank.map(|b| b.account_no.clone()))
    .bind(bank.map(|b| b.ifsc.clone()))
    .bind(bank.map(|b| b.holder.clone()))
    .bind(auth_user.user_id)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "Affiliate account not activated".to_string(),
        ));
    }

    Ok(Json(serde_json::json!({ "message": "Payment method saved" })))
}

/// GET /affiliate/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(affiliate) = affiliate_for_user(&state.db.pool, auth_user.user_id).await? else {
        return Ok(Json(serde_json::json!({
            "active": false,
            "message": "Affiliate account not activated"
        })));
    };

    // Approved requests only; pending money is still in flight.
    let total_withdrawn: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM withdraw_requests WHERE user_id = $1 AND status = 'approved'",
    )
    .bind(auth_user.user_id)
    .fetch_one(&state.db.pool)
    .await?;

    let bank = affiliate.bank_details();
    let profile = AffiliateProfile {
        active: true,
        code: affiliate.code,
        clicks: affiliate.clicks,
        orders: affiliate.orders,
        commission_earned: affiliate.commission_earned,
        level: affiliate.level,
        referral_earnings: affiliate.referral_earnings,
        payout_method: affiliate.payout_method,
        payout_upi: affiliate.payout_upi,
        bank,
        total_withdrawn,
        created_at: affiliate.created_at,
    };

    Ok(Json(serde_json::to_value(profile).map_err(|e| {
        ApiError::Internal(anyhow::anyhow!("serialization failed: {e}"))
    })?))
}

/// POST /affiliate/withdraw
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let record = state
        .withdrawal_service
        .request_withdrawal(auth_user.user_id)
        .await?;

    Ok(Json(WithdrawResponse {
        message: "Withdrawal request sent successfully".to_string(),
        amount: record.amount,
    }))
}

/// GET /affiliate/withdrawals
pub async fn withdraw_history(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<WithdrawRequestRecord>>, ApiError> {
    let history = state.withdrawal_service.history(auth_user.user_id).await?;
    Ok(Json(history))
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// POST /affiliate/click (public)
///
/// Records a referral click; one counted click per (code, address, device,
/// product) per cooldown window.
pub async fn record_click(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RecordClickRequest>,
) -> Result<Json<RecordClickResponse>, ApiError> {
    req.validate()?;

    let ip = client_ip(&headers);
    if !state.click_limiter.allow(&ip) {
        return Err(ApiError::RateLimited);
    }

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let outcome = state
        .click_service
        .record_click(
            &req.ref_code,
            &ip,
            user_agent,
            req.product_id,
            req.city.as_deref(),
        )
        .await?;

    let message = match outcome {
        ClickOutcome::Recorded => "Click logged",
        ClickOutcome::AlreadyRecorded => "Click already recorded recently",
    };

    Ok(Json(RecordClickResponse {
        message: message.to_string(),
    }))
}

/// GET /affiliate/earnings
///
/// Daily series of approved line earnings, bucketed by order date.
pub async fn earnings(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<EarningsByDay>, ApiError> {
    let affiliate = affiliate_for_user(&state.db.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate account not activated".to_string()))?;

    let rows: Vec<(String, Decimal)> = sqlx::query_as(
        r#"
        SELECT to_char(o.created_at, 'YYYY-MM-DD') AS day,
               SUM(l.product_earning) AS amount
        FROM orders o
        JOIN order_lines l ON l.order_id = o.id
        WHERE o.ref_code = $1 AND l.earning_status = 'approved'
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(&affiliate.code)
    .fetch_all(&state.db.pool)
    .await?;

    let (days, amounts) = rows.into_iter().unzip();
    Ok(Json(EarningsByDay { days, amounts }))
}

/// GET /affiliate/analytics
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<AffiliateAnalytics>, ApiError> {
    let affiliate = affiliate_for_user(&state.db.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Affiliate account not found".to_string()))?;

    let code = &affiliate.code;

    let (clicks, unique_ips, mobile, desktop): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(DISTINCT ip),
               COUNT(*) FILTER (WHERE device = 'mobile'),
               COUNT(*) FILTER (WHERE device = 'desktop')
        FROM click_logs
        WHERE code = $1
        "#,
    )
    .bind(code)
    .fetch_one(&state.db.pool)
    .await?;

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ref_code = $1")
        .bind(code)
        .fetch_one(&state.db.pool)
        .await?;

    let conversion_rate = if clicks == 0 {
        0.0
    } else {
        ((orders as f64 / clicks as f64) * 10_000.0).round() / 100.0
    };

    let city_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT city, COUNT(*) FROM click_logs WHERE code = $1 GROUP BY city ORDER BY COUNT(*) DESC",
    )
    .bind(code)
    .fetch_all(&state.db.pool)
    .await?;

    let product_rows: Vec<(Uuid, i64)> = sqlx::query_as(
        r#"
        SELECT l.product_id, COUNT(*)
        FROM order_lines l
        JOIN orders o ON o.id = l.order_id
        WHERE o.ref_code = $1
        GROUP BY l.product_id
        ORDER BY COUNT(*) DESC
        "#,
    )
    .bind(code)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(AffiliateAnalytics {
        clicks,
        unique_ips,
        repeat_clicks: clicks - unique_ips,
        conversion_rate,
        device_stats: DeviceStats { mobile, desktop },
        city_stats: city_rows
            .into_iter()
            .map(|(city, count)| CityCount { city, count })
            .collect(),
        product_stats: product_rows
            .into_iter()
            .map(|(product_id, count)| ProductCount { product_id, count })
            .collect(),
    }))
}

/// GET /affiliate/orders
///
/// Orders attributed to the caller's code, newest first.
pub async fn my_attributed_orders(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<OrderWithLines>>, ApiError> {
    let Some(affiliate) = affiliate_for_user(&state.db.pool, auth_user.user_id).await? else {
        return Ok(Json(Vec::new()));
    };

    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE ref_code = $1 ORDER BY created_at DESC")
            .bind(&affiliate.code)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affiliate_code_shape() {
        for _ in 0..50 {
            let code = generate_affiliate_code();
            assert!(code.starts_with("AFF"));
            assert_eq!(code.len(), 9);
            assert!(code[3..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.9");

        let empty = HeaderMap::new();
        assert_eq!(client_ip(&empty), "unknown");
    }
}
