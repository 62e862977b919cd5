use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Affiliate tier, ascending. Derived from the lifetime attributed-order
/// count and cached on the account; order lines carry a frozen copy taken at
/// checkout time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "affiliate_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AffiliateTier {
    Newbie,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl AffiliateTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AffiliateTier::Newbie => "newbie",
            AffiliateTier::Bronze => "bronze",
            AffiliateTier::Silver => "silver",
            AffiliateTier::Gold => "gold",
            AffiliateTier::Platinum => "platinum",
            AffiliateTier::Diamond => "diamond",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PayoutMethod {
    Upi,
    Bank,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BankDetails {
    #[validate(length(min = 1, max = 34))]
    pub account_no: String,
    #[validate(length(min = 1, max = 16))]
    pub ifsc: String,
    #[validate(length(min = 1, max = 120))]
    pub holder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Affiliate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub clicks: i64,
    pub orders: i64,
    pub commission_earned: Decimal,
    pub level: AffiliateTier,
    pub referral_earnings: Decimal,
    pub payout_method: Option<PayoutMethod>,
    pub payout_upi: Option<String>,
    pub bank_account_no: Option<String>,
    pub bank_ifsc: Option<String>,
    pub bank_holder: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Affiliate {
    pub fn bank_details(&self) -> Option<BankDetails> {
        match (&self.bank_account_no, &self.bank_ifsc, &self.bank_holder) {
            (Some(account_no), Some(ifsc), Some(holder)) => Some(BankDetails {
                account_no: account_no.clone(),
                ifsc: ifsc.clone(),
                holder: holder.clone(),
            }),
            _ => None,
        }
    }

    /// A withdrawal needs both a chosen method and its destination on file.
    pub fn has_payout_destination(&self) -> bool {
        match self.payout_method {
            Some(PayoutMethod::Upi) => self.payout_upi.is_some(),
            Some(PayoutMethod::Bank) => self.bank_details().is_some(),
            None => false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub message: String,
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentMethodRequest {
    pub method: PayoutMethod,
    #[validate(length(min = 3, max = 120))]
    pub upi: Option<String>,
    #[validate]
    pub bank: Option<BankDetails>,
}

#[derive(Debug, Serialize)]
pub struct AffiliateProfile {
    pub active: bool,
    pub code: String,
    pub clicks: i64,
    pub orders: i64,
    pub commission_earned: Decimal,
    pub level: AffiliateTier,
    pub referral_earnings: Decimal,
    pub payout_method: Option<PayoutMethod>,
    pub payout_upi: Option<String>,
    pub bank: Option<BankDetails>,
    pub total_withdrawn: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Admin listing row: account plus lifetime totals derived from the
/// withdrawal ledger.
#[derive(Debug, Serialize)]
pub struct AffiliateOverview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub code: String,
    pub clicks: i64,
    pub orders: i64,
    pub commission_earned: Decimal,
    pub level: AffiliateTier,
    pub total_withdrawn: Decimal,
    pub total_earning: Decimal,
    pub created_at: DateTime<Utc>,
}
