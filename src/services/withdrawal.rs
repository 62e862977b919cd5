//! Withdrawal ledger
//!
//! Converts accrued commission into a withdrawal request. Creating the
//! request and zeroing the source balance are one transaction, with the
//! account row locked so racing requests cannot draw the same balance
//! twice. Admin status changes are direct overwrites with no side effects —
//! the money already moved to the request at creation.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics;
use crate::models::{Affiliate, WithdrawRequestRecord, WithdrawStatus};

#[derive(Debug, thiserror::Error)]
pub enum WithdrawalError {
    #[error("Activate affiliate account first")]
    NotActivated,

    #[error("Please save a payment method first")]
    PaymentMethodMissing,

    #[error("Minimum {minimum} required to withdraw")]
    BelowMinimum { balance: Decimal, minimum: Decimal },

    #[error("Withdrawal request not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<WithdrawalError> for crate::utils::error::ApiError {
    fn from(err: WithdrawalError) -> Self {
        use crate::utils::error::ApiError;
        match err {
            WithdrawalError::NotActivated | WithdrawalError::PaymentMethodMissing => {
                ApiError::InvalidInput(err.to_string())
            }
            WithdrawalError::BelowMinimum { .. } => ApiError::InvalidInput(err.to_string()),
            WithdrawalError::NotFound => ApiError::NotFound(err.to_string()),
            WithdrawalError::Database(e) => ApiError::Database(e),
        }
    }
}

pub struct WithdrawalService {
    pool: PgPool,
    minimum: Decimal,
}

impl WithdrawalService {
    pub fn new(pool: PgPool, minimum: Decimal) -> Self {
        Self { pool, minimum }
    }

    /// Open a withdrawal request for the caller's full commission balance.
    pub async fn request_withdrawal(
        &self,
        user_id: Uuid,
    ) -> Result<WithdrawRequestRecord, WithdrawalError> {
        let mut tx = self.pool.begin().await?;

        let affiliate: Affiliate =
            sqlx::query_as("SELECT * FROM affiliates WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(WithdrawalError::NotActivated)?;

        if !affiliate.has_payout_destination() {
            return Err(WithdrawalError::PaymentMethodMissing);
        }

        if affiliate.commission_earned < self.minimum {
            return Err(WithdrawalError::BelowMinimum {
                balance: affiliate.commission_earned,
                minimum: self.minimum,
            });
        }

        // Snapshot amount and payout destination; the request stays intact
        // even if the account's payment details change later.
        let record: WithdrawRequestRecord = sqlx::query_as(
            r#"
            INSERT INTO withdraw_requests (
                affiliate_code, user_id, amount,
                payout_method, payout_upi,
                bank_account_no, bank_ifsc, bank_holder
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&affiliate.code)
        .bind(user_id)
        .bind(affiliate.commission_earned)
        .bind(affiliate.payout_method)
        .bind(&affiliate.payout_upi)
        .bind(&affiliate.bank_account_no)
        .bind(&affiliate.bank_ifsc)
        .bind(&affiliate.bank_holder)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE affiliates SET commission_earned = 0 WHERE id = $1")
            .bind(affiliate.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        metrics::record_withdraw_request();
        tracing::info!(
            "Withdrawal request {} opened for {} ({})",
            record.id,
            affiliate.code,
            record.amount
        );

        Ok(record)
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<WithdrawRequestRecord>, WithdrawalError> {
        let rows = sqlx::query_as(
            "SELECT * FROM withdraw_requests WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Admin status overwrite. Approval does not re-credit or re-debit.
    pub async fn set_status(
        &self,
        request_id: Uuid,
        status: WithdrawStatus,
    ) -> Result<WithdrawRequestRecord, WithdrawalError> {
        let record: Option<WithdrawRequestRecord> = sqlx::query_as(
            "UPDATE withdraw_requests SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or(WithdrawalError::NotFound)
    }
}
