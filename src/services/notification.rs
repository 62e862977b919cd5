//! Outbound notifications via an HTTP mail relay
//!
//! Strictly fire-and-forget: every delivery failure is logged and counted,
//! none propagates to the caller. An empty relay URL disables sending.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::metrics;

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub item_count: usize,
    pub final_amount: Decimal,
    pub payment_method: String,
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

pub struct Notifier {
    client: reqwest::Client,
    relay_url: String,
    from: String,
    admin_email: String,
}

impl Notifier {
    pub fn new(relay_url: &str, from: &str, admin_email: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: relay_url.to_string(),
            from: from.to_string(),
            admin_email: admin_email.to_string(),
        }
    }

    async fn deliver(&self, kind: &str, to: &str, subject: &str, text: String) {
        if self.relay_url.is_empty() {
            tracing::debug!("Mail relay not configured, skipping {} to {}", kind, to);
            return;
        }

        let payload = MailPayload {
            from: &self.from,
            to,
            subject,
            text,
        };

        let result = self
            .client
            .post(&self.relay_url)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(_) => tracing::debug!("Sent {} notification to {}", kind, to),
            Err(e) => {
                tracing::warn!("Failed to send {} notification to {}: {}", kind, to, e);
                metrics::record_notification_failure(kind);
            }
        }
    }

    pub async fn send_order_confirmation(&self, to: &str, order: &OrderSummary) {
        let text = format!(
            "Your order {} ({} item(s), {} via {}) has been placed. \
             We'll let you know when it ships.",
            order.order_id, order.item_count, order.final_amount, order.payment_method
        );
        self.deliver("order_confirmation", to, "Order confirmed", text)
            .await;
    }

    pub async fn send_admin_order_alert(&self, buyer_email: &str, order: &OrderSummary) {
        let text = format!(
            "New order {} from {}: {} item(s), {} via {}.",
            order.order_id,
            buyer_email,
            order.item_count,
            order.final_amount,
            order.payment_method
        );
        let to = self.admin_email.clone();
        self.deliver("admin_order_alert", &to, "New order received", text)
            .await;
    }

    pub async fn send_password_otp(&self, to: &str, code: &str) {
        let text = format!("Your password reset code is {}. Valid for 5 minutes.", code);
        self.deliver("password_otp", to, "Password reset code", text)
            .await;
    }
}
