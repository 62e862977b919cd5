//! Admin dashboard: read-only projections over the affiliate ledger.

use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Affiliate, AffiliateTier};
use crate::utils::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TierCounts {
    pub newbie: i64,
    pub bronze: i64,
    pub silver: i64,
    pub gold: i64,
    pub platinum: i64,
    pub diamond: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_affiliates: i64,
    pub levels: TierCounts,
    pub top_all_time: Option<Affiliate>,
}

/// GET /admin/dashboard/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let (total, newbie, bronze, silver, gold, platinum, diamond): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE level = 'newbie'),
               COUNT(*) FILTER (WHERE level = 'bronze'),
               COUNT(*) FILTER (WHERE level = 'silver'),
               COUNT(*) FILTER (WHERE level = 'gold'),
               COUNT(*) FILTER (WHERE level = 'platinum'),
               COUNT(*) FILTER (WHERE level = 'diamond')
        FROM affiliates
        "#,
    )
    .fetch_one(&state.db.pool)
    .await?;

    let top_all_time: Option<Affiliate> =
        sqlx::query_as("SELECT * FROM affiliates ORDER BY commission_earned DESC LIMIT 1")
            .fetch_optional(&state.db.pool)
            .await?;

    Ok(Json(SummaryResponse {
        total_affiliates: total,
        levels: TierCounts {
            newbie,
            bronze,
            silver,
            gold,
            platinum,
            diamond,
        },
        top_all_time,
    }))
}

#[derive(Debug, Serialize)]
pub struct TopEarner {
    pub code: String,
    pub user_id: Uuid,
    pub level: AffiliateTier,
    pub total_earnings: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TopEarnersResponse {
    pub top24h: Option<TopEarner>,
    pub top7d: Option<TopEarner>,
    pub top30d: Option<TopEarner>,
}

/// Best account in a window: approved line earnings on orders placed in the
/// window, plus withdrawal requests opened in the window (balance already
/// moved out of the account).
async fn top_in_range(
    pool: &sqlx::PgPool,
    since: DateTime<Utc>,
) -> Result<Option<TopEarner>, sqlx::Error> {
    let row: Option<(String, Uuid, AffiliateTier, Decimal)> = sqlx::query_as(
        r#"
        SELECT a.code, a.user_id, a.level,
               COALESCE(e.earned, 0) + COALESCE(w.withdrawn, 0) AS total
        FROM affiliates a
        LEFT JOIN (
            SELECT o.ref_code AS code, SUM(l.product_earning) AS earned
            FROM orders o
            JOIN order_lines l ON l.order_id = o.id
            WHERE l.earning_status = 'approved' AND o.created_at >= $1
            GROUP BY o.ref_code
        ) e ON e.code = a.code
        LEFT JOIN (
            SELECT user_id, SUM(amount) AS withdrawn
            FROM withdraw_requests
            WHERE created_at >= $1
            GROUP BY user_id
        ) w ON w.user_id = a.user_id
        ORDER BY total DESC
        LIMIT 1
        "#,
    )
    .bind(since)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(code, user_id, level, total_earnings)| TopEarner {
        code,
        user_id,
        level,
        total_earnings,
    }))
}

/// GET /admin/dashboard/top-earners
pub async fn top_earners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TopEarnersResponse>, ApiError> {
    let now = Utc::now();

    let top24h = top_in_range(&state.db.pool, now - Duration::hours(24)).await?;
    let top7d = top_in_range(&state.db.pool, now - Duration::days(7)).await?;
    let top30d = top_in_range(&state.db.pool, now - Duration::days(30)).await?;

    Ok(Json(TopEarnersResponse {
        top24h,
        top7d,
        top30d,
    }))
}

#[derive(Debug, Serialize)]
pub struct BestProduct {
    pub product_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub count: i64,
}

/// GET /admin/dashboard/best-products
///
/// Top products across attributed orders.
pub async fn best_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BestProduct>>, ApiError> {
    let rows: Vec<(Uuid, String, Option<String>, i64)> = sqlx::query_as(
        r#"
        SELECT l.product_id, MAX(l.title), MAX(l.image_url), COUNT(*)
        FROM order_lines l
        JOIN orders o ON o.id = l.order_id
        WHERE o.ref_code IS NOT NULL
        GROUP BY l.product_id
        ORDER BY COUNT(*) DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    let best = rows
        .into_iter()
        .map(|(product_id, title, image_url, count)| BestProduct {
            product_id,
            title,
            image_url,
            count,
        })
        .collect();

    Ok(Json(best))
}

#[derive(Debug, Serialize)]
pub struct OrdersGraphPoint {
    pub day: String,
    pub affiliate_orders: i64,
    pub normal_orders: i64,
}

/// GET /admin/dashboard/orders-graph
///
/// Last 30 days of attributed vs normal order counts per day.
pub async fn orders_graph(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrdersGraphPoint>>, ApiError> {
    let since = Utc::now() - Duration::days(30);

    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT to_char(created_at, 'YYYY-MM-DD') AS day,
               COUNT(*) FILTER (WHERE ref_code IS NOT NULL),
               COUNT(*) FILTER (WHERE ref_code IS NULL)
        FROM orders
        WHERE created_at >= $1
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(since)
    .fetch_all(&state.db.pool)
    .await?;

    let points = rows
        .into_iter()
        .map(|(day, affiliate_orders, normal_orders)| OrdersGraphPoint {
            day,
            affiliate_orders,
            normal_orders,
        })
        .collect();

    Ok(Json(points))
}
