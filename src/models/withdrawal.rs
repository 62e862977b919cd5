use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::affiliate::PayoutMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "withdraw_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawStatus {
    Pending,
    Approved,
    Rejected,
}

/// A withdrawal request snapshots the balance and payout destination at
/// creation; admin status changes never recompute either.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WithdrawRequestRecord {
    pub id: Uuid,
    pub affiliate_code: String,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub payout_method: PayoutMethod,
    pub payout_upi: Option<String>,
    pub bank_account_no: Option<String>,
    pub bank_ifsc: Option<String>,
    pub bank_holder: Option<String>,
    pub status: WithdrawStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SetWithdrawStatusRequest {
    pub status: WithdrawStatus,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub message: String,
    pub amount: Decimal,
}
