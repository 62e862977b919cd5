//! Payment gateway integration via REST API (no SDK dependency)
//!
//! Creates externally-hosted payment orders; this system only records the
//! gateway order id for bookkeeping, no money moves here.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}

pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    currency: String,
}

impl PaymentGateway {
    pub fn new(base_url: &str, key_id: &str, key_secret: &str, currency: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            currency: currency.to_string(),
        }
    }

    /// Gateways take amounts in minor units (paise, cents).
    pub fn to_minor_units(amount: Decimal) -> Option<i64> {
        (amount * Decimal::from(100)).round().to_i64()
    }

    pub async fn create_order(&self, amount: Decimal, receipt: &str) -> anyhow::Result<PaymentOrder> {
        let amount_minor = Self::to_minor_units(amount)
            .filter(|minor| *minor > 0)
            .ok_or_else(|| anyhow::anyhow!("payment amount must be positive"))?;

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({
                "amount": amount_minor,
                "currency": self.currency,
                "receipt": receipt,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let id = resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("gateway order creation failed: {resp}"))?;

        Ok(PaymentOrder {
            id,
            amount_minor,
            currency: self.currency.clone(),
            receipt: receipt.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(PaymentGateway::to_minor_units(dec!(499.50)), Some(49950));
        assert_eq!(PaymentGateway::to_minor_units(dec!(0.01)), Some(1));
        assert_eq!(PaymentGateway::to_minor_units(dec!(1000)), Some(100000));
    }

    #[test]
    fn rounds_sub_minor_amounts() {
        assert_eq!(PaymentGateway::to_minor_units(dec!(1.005)), Some(100));
        assert_eq!(PaymentGateway::to_minor_units(dec!(1.006)), Some(101));
    }
}
