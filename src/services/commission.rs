//! Order attribution and earning pipeline
//!
//! Checkout validates the caller-supplied referral code, freezes the
//! affiliate's tier onto every order line, and bumps the account's lifetime
//! order counter. Admin approval later converts a pending line into credited
//! commission, computed from the frozen tier — the earning-status flip and
//! the balance credit share one transaction so a retry can never
//! double-credit.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics;
use crate::models::{AffiliateTier, EarningStatus, PayoutMethod, PlaceOrderRequest, ReturnRequestPayload};
use crate::services::leveling;

#[derive(Debug, thiserror::Error)]
pub enum CommissionError {
    #[error("Order not found")]
    OrderNotFound,

    #[error("Order line not found")]
    LineNotFound,

    #[error("Order has no affiliate attribution")]
    NotAttributed,

    #[error("No affiliate account holds code {0}")]
    AffiliateNotFound(String),

    #[error("Return already requested for this item")]
    ReturnAlreadyRequested,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<CommissionError> for crate::utils::error::ApiError {
    fn from(err: CommissionError) -> Self {
        use crate::utils::error::ApiError;
        match err {
            CommissionError::OrderNotFound
            | CommissionError::LineNotFound
            | CommissionError::AffiliateNotFound(_) => ApiError::NotFound(err.to_string()),
            CommissionError::NotAttributed | CommissionError::ReturnAlreadyRequested => {
                ApiError::InvalidInput(err.to_string())
            }
            CommissionError::Database(e) => ApiError::Database(e),
        }
    }
}

/// Result of an earning transition; re-applying a terminal transition is a
/// reported no-op, never an error.
#[derive(Debug, PartialEq)]
pub enum EarningOutcome {
    Applied { amount: Decimal },
    AlreadyApplied,
}

pub struct CommissionService {
    pool: PgPool,
}

impl CommissionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order, attributing it to an affiliate when the referral
    /// code checks out. An invalid or stale code is stored as no attribution
    /// — checkout never fails because of it.
    pub async fn place_order(
        &self,
        user_id: Uuid,
        req: &PlaceOrderRequest,
    ) -> Result<Uuid, CommissionError> {
        // Untrusted input: only a code matching a real account is kept.
        let attribution: Option<(String, AffiliateTier)> = match req
            .ref_code
            .as_deref()
            .filter(|c| !c.is_empty())
        {
            Some(code) => {
                sqlx::query_as("SELECT code, level FROM affiliates WHERE code = $1")
                    .bind(code)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let (valid_ref, tier_snapshot) = match &attribution {
            Some((code, level)) => (Some(code.as_str()), Some(*level)),
            None => (None, None),
        };

        let mut tx = self.pool.begin().await?;

        let order_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                user_id, ref_code,
                addr_name, addr_phone, addr_street, addr_full,
                addr_pincode, addr_city, addr_state,
                total, discount, final_amount, payment_method
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(valid_ref)
        .bind(&req.address.name)
        .bind(&req.address.phone)
        .bind(&req.address.street)
        .bind(req.address.full_address())
        .bind(&req.address.pincode)
        .bind(&req.address.city)
        .bind(&req.address.state)
        .bind(req.total)
        .bind(req.discount)
        .bind(req.final_amount)
        .bind(&req.payment_method)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in req.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    order_id, position, product_id, title, size, image_url,
                    unit_price, qty, affiliate_level_at_time
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(order_id)
            .bind(position as i32)
            .bind(item.product_id)
            .bind(&item.title)
            .bind(&item.size)
            .bind(&item.image_url)
            .bind(item.unit_price)
            .bind(item.qty)
            .bind(tier_snapshot)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        // Once per order, not per line: atomic counter bump, then a
        // compare-and-set tier recompute so a racing order wins with the
        // fresher count.
        if let Some((code, _)) = &attribution {
            let lifetime_orders: i64 = sqlx::query_scalar(
                "UPDATE affiliates SET orders = orders + 1 WHERE code = $1 RETURNING orders",
            )
            .bind(code)
            .fetch_one(&self.pool)
            .await?;

            let level = leveling::tier_for_orders(lifetime_orders);
            sqlx::query("UPDATE affiliates SET level = $1 WHERE code = $2 AND orders = $3")
                .bind(level)
                .bind(code)
                .bind(lifetime_orders)
                .execute(&self.pool)
                .await?;

            tracing::info!(
                "Order {} attributed to {} (lifetime orders: {}, level: {})",
                order_id,
                code,
                lifetime_orders,
                level.as_str()
            );
        }

        metrics::record_order_placed(attribution.is_some());
        Ok(order_id)
    }

    /// Approve the earning on one order line, crediting the affiliate once.
    ///
    /// The commission comes from the tier frozen on the line at checkout,
    /// never from the account's current tier.
    pub async fn approve_earning(
        &self,
        order_id: Uuid,
        line_index: i32,
    ) -> Result<EarningOutcome, CommissionError> {
        let mut tx = self.pool.begin().await?;

        let ref_code: Option<String> =
            sqlx::query_scalar("SELECT ref_code FROM orders WHERE id = $1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CommissionError::OrderNotFound)?;

        let code = ref_code.ok_or(CommissionError::NotAttributed)?;

        let line: Option<(Uuid, i32, Option<AffiliateTier>, EarningStatus)> = sqlx::query_as(
            r#"
            SELECT id, qty, affiliate_level_at_time, earning_status
            FROM order_lines
            WHERE order_id = $1 AND position = $2
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .bind(line_index)
        .fetch_optional(&mut *tx)
        .await?;

        let (line_id, qty, tier_snapshot, status) =
            line.ok_or(CommissionError::LineNotFound)?;

        let affiliate_id: Uuid =
            sqlx::query_scalar("SELECT id FROM affiliates WHERE code = $1 FOR UPDATE")
                .bind(&code)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CommissionError::AffiliateNotFound(code.clone()))?;

        if status == EarningStatus::Approved {
            return Ok(EarningOutcome::AlreadyApplied);
        }

        let commission = leveling::line_commission(tier_snapshot, qty);

        sqlx::query(
            "UPDATE order_lines SET product_earning = $1, earning_status = 'approved' WHERE id = $2",
        )
        .bind(commission)
        .bind(line_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE affiliates SET commission_earned = commission_earned + $1 WHERE id = $2",
        )
        .bind(commission)
        .bind(affiliate_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let tier_label = tier_snapshot.map(|t| t.as_str()).unwrap_or("unknown");
        metrics::record_earning_approved(tier_label, commission.to_f64().unwrap_or(0.0));
        tracing::info!(
            "Earning approved: order {} line {} -> {} credited to {}",
            order_id,
            line_index,
            commission,
            code
        );

        Ok(EarningOutcome::Applied { amount: commission })
    }

    /// Reject the earning on one order line. The earning value keeps its
    /// last state and no balance moves.
    pub async fn reject_earning(
        &self,
        order_id: Uuid,
        line_index: i32,
    ) -> Result<EarningOutcome, CommissionError> {
        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(CommissionError::OrderNotFound);
        }

        let status: EarningStatus = sqlx::query_scalar(
            "SELECT earning_status FROM order_lines WHERE order_id = $1 AND position = $2",
        )
        .bind(order_id)
        .bind(line_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CommissionError::LineNotFound)?;

        if status == EarningStatus::Rejected {
            return Ok(EarningOutcome::AlreadyApplied);
        }

        sqlx::query(
            "UPDATE order_lines SET earning_status = 'rejected' WHERE order_id = $1 AND position = $2",
        )
        .bind(order_id)
        .bind(line_index)
        .execute(&self.pool)
        .await?;

        metrics::record_earning_rejected();
        Ok(EarningOutcome::Applied {
            amount: Decimal::ZERO,
        })
    }

    /// Customer return request on a single line: a one-way flag, accepted
    /// once. Independent of the line's earning state.
    pub async fn request_return(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        line_index: i32,
        payload: &ReturnRequestPayload,
    ) -> Result<(), CommissionError> {
        let owned: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM orders WHERE id = $1 AND user_id = $2")
                .bind(order_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        if owned.is_none() {
            return Err(CommissionError::OrderNotFound);
        }

        let requested: bool = sqlx::query_scalar(
            "SELECT return_requested FROM order_lines WHERE order_id = $1 AND position = $2",
        )
        .bind(order_id)
        .bind(line_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CommissionError::LineNotFound)?;

        if requested {
            return Err(CommissionError::ReturnAlreadyRequested);
        }

        let (upi, bank) = match payload.refund_method {
            Some(PayoutMethod::Upi) => (payload.upi.clone(), None),
            Some(PayoutMethod::Bank) => (None, payload.bank.clone()),
            None => (None, None),
        };

        sqlx::query(
            r#"
            UPDATE order_lines
            SET return_requested = TRUE,
                return_reason = $1,
                return_date = NOW(),
                return_status = 'pending',
                refund_method = $2,
                refund_upi = $3,
                refund_bank_account_no = $4,
                refund_bank_ifsc = $5,
                refund_bank_holder = $6
            WHERE order_id = $7 AND position = $8 AND NOT return_requested
            "#,
        )
        .bind(&payload.reason)
        .bind(payload.refund_method)
        .bind(upi)
        .bind(bank.as_ref().map(|b| b.account_no.clone()))
        .bind(bank.as_ref().map(|b| b.ifsc.clone()))
        .bind(bank.as_ref().map(|b| b.holder.clone()))
        .bind(order_id)
        .bind(line_index)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
