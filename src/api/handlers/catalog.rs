//! Product catalog handlers. Public listing and lookup, admin CRUD.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateProductRequest, Product, ProductsQuery, UpdateProductRequest};
use crate::utils::error::ApiError;
use crate::AppState;

/// GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let limit = query.limit.unwrap_or(50).min(200);
    let offset = query.offset.unwrap_or(0);

    let products: Vec<Product> = sqlx::query_as(
        r#"
        SELECT * FROM products
        WHERE ($1::product_category IS NULL OR category = $1)
          AND ($2::boolean IS NULL OR trending = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.category)
    .bind(query.trending)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(products))
}

/// GET /products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.db.pool)
        .await?;

    product
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

/// POST /admin/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    req.validate()?;

    if req.price < Decimal::ZERO || req.original_price < Decimal::ZERO {
        return Err(ApiError::InvalidInput(
            "Price must not be negative".to_string(),
        ));
    }

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (
            title, category, price, original_price, description,
            image_url, more_images, sizes, trending
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&req.title)
    .bind(req.category)
    .bind(req.price)
    .bind(req.original_price)
    .bind(&req.description)
    .bind(&req.image_url)
    .bind(&req.more_images)
    .bind(&req.sizes)
    .bind(req.trending)
    .fetch_one(&state.db.pool)
    .await?;

    tracing::info!("Product created: {} ({})", product.title, product.id);
    Ok(Json(product))
}

/// PUT /admin/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    req.validate()?;

    if matches!(req.price, Some(p) if p < Decimal::ZERO) {
        return Err(ApiError::InvalidInput(
            "Price must not be negative".to_string(),
        ));
    }

    let product: Option<Product> = sqlx::query_as(
        r#"
        UPDATE products
        SET title = COALESCE($1, title),
            category = COALESCE($2, category),
            price = COALESCE($3, price),
            original_price = COALESCE($4, original_price),
            description = COALESCE($5, description),
            image_url = COALESCE($6, image_url),
            more_images = COALESCE($7, more_images),
            sizes = COALESCE($8, sizes),
            trending = COALESCE($9, trending),
            updated_at = NOW()
        WHERE id = $10
        RETURNING *
        "#,
    )
    .bind(&req.title)
    .bind(req.category)
    .bind(req.price)
    .bind(req.original_price)
    .bind(&req.description)
    .bind(&req.image_url)
    .bind(&req.more_images)
    .bind(&req.sizes)
    .bind(req.trending)
    .bind(product_id)
    .fetch_optional(&state.db.pool)
    .await?;

    product
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

/// DELETE /admin/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}
