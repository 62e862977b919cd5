//! Cart and wishlist handlers.
//!
//! Cart lines are keyed by (product, size); re-adding replaces the quantity
//! and keeps the most recent referral code seen for that line.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::models::{
    AddCartItemsRequest, CartItem, CartResponse, ToggleWishlistRequest, WishlistItem,
    WishlistResponse,
};
use crate::utils::error::ApiError;
use crate::AppState;

/// GET /cart
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<CartResponse>, ApiError> {
    let items: Vec<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY updated_at DESC")
            .bind(auth_user.user_id)
            .fetch_all(&state.db.pool)
            .await?;

    Ok(Json(CartResponse { items }))
}

/// POST /cart
pub async fn add_items(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<AddCartItemsRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    req.validate()?;
    for item in &req.items {
        item.validate()?;
    }

    for item in &req.items {
        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, title, image_url, size, unit_price, qty, ref_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, product_id, size)
            DO UPDATE SET
                qty = EXCLUDED.qty,
                title = EXCLUDED.title,
                image_url = EXCLUDED.image_url,
                unit_price = EXCLUDED.unit_price,
                ref_code = COALESCE(EXCLUDED.ref_code, cart_items.ref_code),
                updated_at = NOW()
            "#,
        )
        .bind(auth_user.user_id)
        .bind(item.product_id)
        .bind(&item.title)
        .bind(&item.image_url)
        .bind(&item.size)
        .bind(item.unit_price)
        .bind(item.qty)
        .bind(&item.ref_code)
        .execute(&state.db.pool)
        .await?;
    }

    let items: Vec<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY updated_at DESC")
            .bind(auth_user.user_id)
            .fetch_all(&state.db.pool)
            .await?;

    Ok(Json(CartResponse { items }))
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemQuery {
    pub size: Option<String>,
}

/// DELETE /cart/:product_id
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<RemoveItemQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items
        WHERE user_id = $1 AND product_id = $2 AND ($3::text IS NULL OR size = $3)
        "#,
    )
    .bind(auth_user.user_id)
    .bind(product_id)
    .bind(&query.size)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Cart item not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Removed from cart" })))
}

/// DELETE /cart
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(auth_user.user_id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Cart cleared" })))
}

/// GET /wishlist
pub async fn get_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let items: Vec<WishlistItem> =
        sqlx::query_as("SELECT * FROM wishlist_items WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(auth_user.user_id)
            .fetch_all(&state.db.pool)
            .await?;

    Ok(Json(WishlistResponse { items }))
}

/// POST /wishlist/toggle
pub async fn toggle_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<ToggleWishlistRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let removed = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(auth_user.user_id)
        .bind(req.product_id)
        .execute(&state.db.pool)
        .await?;

    if removed.rows_affected() > 0 {
        return Ok(Json(serde_json::json!({ "message": "Removed from wishlist" })));
    }

    sqlx::query(
        "INSERT INTO wishlist_items (user_id, product_id, title, image_url, price) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(auth_user.user_id)
    .bind(req.product_id)
    .bind(&req.title)
    .bind(&req.image_url)
    .bind(req.price)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(serde_json::json!({ "message": "Added to wishlist" })))
}
