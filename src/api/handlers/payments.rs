//! Payment intent handler: creates a hosted gateway order for checkout.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::payment::PaymentOrder;
use crate::utils::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub amount: Decimal,
}

/// POST /payments/intent
pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<PaymentOrder>, ApiError> {
    if req.amount <= Decimal::ZERO {
        return Err(ApiError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }

    let receipt = format!("rcpt_{}", Uuid::new_v4().simple());

    let order = state
        .payment_gateway
        .create_order(req.amount, &receipt)
        .await
        .map_err(|e| {
            tracing::error!("Gateway order creation failed: {:#}", e);
            ApiError::Internal(anyhow::anyhow!("Failed to create payment order"))
        })?;

    Ok(Json(order))
}
