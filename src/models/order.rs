use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::affiliate::{AffiliateTier, BankDetails, PayoutMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Per-line commission approval lifecycle. Pending is the only non-terminal
/// state; approved and rejected transitions are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "earning_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EarningStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "return_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Populated only when the checkout referral code matched a real
    /// affiliate account.
    pub ref_code: Option<String>,
    pub addr_name: String,
    pub addr_phone: String,
    pub addr_street: String,
    pub addr_full: String,
    pub addr_pincode: String,
    pub addr_city: String,
    pub addr_state: String,
    pub total: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub title: String,
    pub size: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub qty: i32,
    /// Affiliate tier frozen at the moment of sale; commission is always
    /// computed from this, never from the account's current tier.
    pub affiliate_level_at_time: Option<AffiliateTier>,
    pub product_earning: Decimal,
    pub earning_status: EarningStatus,
    pub return_requested: bool,
    pub return_reason: String,
    pub return_date: Option<DateTime<Utc>>,
    pub return_status: ReturnStatus,
    pub refund_method: Option<PayoutMethod>,
    pub refund_upi: Option<String>,
    pub refund_bank_account_no: Option<String>,
    pub refund_bank_ifsc: Option<String>,
    pub refund_bank_holder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 4, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    pub place: Option<String>,
    pub road: Option<String>,
    #[validate(length(min = 4, max = 10))]
    pub pincode: String,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(length(min = 1, max = 120))]
    pub state: String,
}

impl AddressInput {
    /// Single-line form kept on the order as a snapshot.
    pub fn full_address(&self) -> String {
        let mut parts = vec![self.street.clone()];
        if let Some(place) = &self.place {
            parts.push(place.clone());
        }
        if let Some(road) = &self.road {
            parts.push(road.clone());
        }
        parts.push(self.city.clone());
        format!("{}, {} - {}", parts.join(", "), self.state, self.pincode)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub size: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    #[validate(range(min = 1))]
    pub qty: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1))]
    pub items: Vec<OrderItemInput>,
    #[validate]
    pub address: AddressInput,
    pub total: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub final_amount: Decimal,
    #[validate(length(min = 1, max = 40))]
    pub payment_method: String,
    /// Untrusted caller-supplied referral code.
    #[serde(rename = "ref")]
    pub ref_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReturnRequestPayload {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    pub refund_method: Option<PayoutMethod>,
    pub upi: Option<String>,
    #[validate]
    pub bank: Option<BankDetails>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnDecisionRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct EarningActionRequest {
    pub order_id: Uuid,
    pub line_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_address_includes_optional_parts() {
        let addr = AddressInput {
            name: "A".into(),
            phone: "9999999999".into(),
            street: "12 High St".into(),
            place: Some("Old Town".into()),
            road: None,
            pincode: "560001".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
        };
        assert_eq!(
            addr.full_address(),
            "12 High St, Old Town, Bengaluru, Karnataka - 560001"
        );
    }
}
