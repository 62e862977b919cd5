use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Bags,
    Dresses,
    Electronics,
    Casual,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub category: ProductCategory,
    pub price: Decimal,
    pub original_price: Decimal,
    pub description: String,
    pub image_url: Option<String>,
    pub more_images: Vec<String>,
    pub sizes: Vec<String>,
    pub trending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub category: ProductCategory,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Decimal,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub more_images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub trending: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub more_images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub trending: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<ProductCategory>,
    pub trending: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
