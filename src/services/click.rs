//! Click attribution ledger
//!
//! Records referral clicks, deduplicates repeats from the same visitor
//! within a cooldown window, and keeps the affiliate's raw click counter in
//! step. Events expire after a fixed retention window; an hourly sweep
//! deletes them.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics;
use crate::models::{ClickLog, DeviceClass};

/// Coarse device classification from the user agent.
pub fn classify_device(user_agent: &str) -> DeviceClass {
    if user_agent.contains("Mobile") {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Recorded,
    AlreadyRecorded,
}

pub struct ClickService {
    pool: PgPool,
    dedup_window: Duration,
    retention: Duration,
}

impl ClickService {
    pub fn new(pool: PgPool, dedup_hours: i64, retention_days: i64) -> Self {
        Self {
            pool,
            dedup_window: Duration::hours(dedup_hours),
            retention: Duration::days(retention_days),
        }
    }

    /// Record one referral click.
    ///
    /// A click with the same (code, ip, device, product) tuple inside the
    /// cooldown window changes nothing. Otherwise the event is written and
    /// the matching account's counter incremented in the same transaction —
    /// the event is the source of truth, the counter is derived from it. A
    /// code with no account still logs the event.
    pub async fn record_click(
        &self,
        code: &str,
        ip: &str,
        user_agent: &str,
        product_id: Option<Uuid>,
        city: Option<&str>,
    ) -> Result<ClickOutcome, sqlx::Error> {
        let device = classify_device(user_agent);
        let now = Utc::now();
        let since = now - self.dedup_window;

        let duplicate: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM click_logs
            WHERE code = $1
              AND ip = $2
              AND device = $3
              AND product_id IS NOT DISTINCT FROM $4
              AND created_at >= $5
            LIMIT 1
            "#,
        )
        .bind(code)
        .bind(ip)
        .bind(device)
        .bind(product_id)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        if duplicate.is_some() {
            metrics::record_click_deduplicated();
            return Ok(ClickOutcome::AlreadyRecorded);
        }

        let mut tx = self.pool.begin().await?;

        let event: ClickLog = sqlx::query_as(
            r#"
            INSERT INTO click_logs (code, ip, device, city, product_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(ip)
        .bind(device)
        .bind(city.filter(|c| !c.is_empty()).unwrap_or("Unknown"))
        .bind(product_id)
        .bind(now)
        .bind(now + self.retention)
        .fetch_one(&mut *tx)
        .await?;

        // No-op when the code matches no account; the event above still
        // stands for later reconciliation.
        sqlx::query("UPDATE affiliates SET clicks = clicks + 1 WHERE code = $1")
            .bind(code)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        metrics::record_click(device.as_str());
        tracing::debug!("Click {} logged for code {}", event.id, event.code);
        Ok(ClickOutcome::Recorded)
    }

    /// Delete events past their retention window. Returns the row count.
    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM click_logs WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_user_agents() {
        assert_eq!(
            classify_device("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile/15E148"),
            DeviceClass::Mobile
        );
        assert_eq!(
            classify_device("Mozilla/5.0 (Linux; Android 14) Mobile Safari/537.36"),
            DeviceClass::Mobile
        );
    }

    #[test]
    fn desktop_user_agents() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            DeviceClass::Desktop
        );
        assert_eq!(
            classify_device("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)"),
            DeviceClass::Desktop
        );
        assert_eq!(classify_device(""), DeviceClass::Desktop);
    }
}
