use config::{Config, Environment};
use serde::Deserialize;

/// Application configuration, loaded from the environment (optionally via a
/// `.env` file loaded in `main`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub database_url: String,

    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,

    /// Inbox that receives a copy of every order confirmation.
    pub admin_email: String,
    /// HTTP mail relay the notifier posts to. Empty disables outbound mail.
    pub mail_relay_url: String,
    pub mail_from: String,

    /// Payment gateway REST API (hosted order creation).
    pub payment_api_url: String,
    pub payment_key_id: String,
    pub payment_key_secret: String,
    pub currency: String,

    /// Minimum commission balance required to open a withdrawal request.
    pub min_withdrawal: u32,

    /// Click dedup cooldown and log retention.
    pub click_dedup_hours: i64,
    pub click_retention_days: i64,
    pub click_reaper_interval_secs: u64,

    /// Rate limit for the public click-tracking endpoint.
    pub click_rate_limit_per_minute: u32,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let cfg = Config::builder()
            .set_default("environment", "development")?
            .set_default("port", 8080)?
            .set_default("jwt_expiry_seconds", 172_800)? // 2 days
            .set_default("admin_email", "orders@storefront.local")?
            .set_default("mail_relay_url", "")?
            .set_default("mail_from", "no-reply@storefront.local")?
            .set_default("payment_api_url", "https://api.razorpay.com/v1")?
            .set_default("payment_key_id", "")?
            .set_default("payment_key_secret", "")?
            .set_default("currency", "INR")?
            .set_default("min_withdrawal", 100)?
            .set_default("click_dedup_hours", 24)?
            .set_default("click_retention_days", 30)?
            .set_default("click_reaper_interval_secs", 3600)?
            .set_default("click_rate_limit_per_minute", 60)?
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_minimal() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/storefront_test");
        std::env::set_var("JWT_SECRET", "test_secret");

        let cfg = AppConfig::load().expect("config should load with defaults");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.min_withdrawal, 100);
        assert_eq!(cfg.click_dedup_hours, 24);
        assert_eq!(cfg.click_retention_days, 30);
    }
}
