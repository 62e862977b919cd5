use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub size: String,
    pub unit_price: Decimal,
    pub qty: i32,
    /// Referral code captured when the item entered the cart; carried
    /// through to checkout attribution.
    pub ref_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CartItemInput {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub size: String,
    pub unit_price: Decimal,
    #[validate(range(min = 1))]
    pub qty: i32,
    #[serde(rename = "ref")]
    pub ref_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCartItemsRequest {
    #[validate(length(min = 1))]
    pub items: Vec<CartItemInput>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleWishlistRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub image_url: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub items: Vec<WishlistItem>,
}
