use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Coarse device class derived from the user agent at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "device_class", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClickLog {
    pub id: Uuid,
    pub code: String,
    pub ip: String,
    pub device: DeviceClass,
    pub city: String,
    pub product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordClickRequest {
    #[serde(rename = "ref")]
    #[validate(length(min = 1, max = 64))]
    pub ref_code: String,
    pub product_id: Option<Uuid>,
    #[validate(length(max = 120))]
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordClickResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceStats {
    pub mobile: i64,
    pub desktop: i64,
}

#[derive(Debug, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductCount {
    pub product_id: Uuid,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AffiliateAnalytics {
    pub clicks: i64,
    pub unique_ips: i64,
    pub repeat_clicks: i64,
    /// Attributed orders per click, as a percentage.
    pub conversion_rate: f64,
    pub device_stats: DeviceStats,
    pub city_stats: Vec<CityCount>,
    pub product_stats: Vec<ProductCount>,
}

/// Daily approved-earning series for the affiliate dashboard graph.
#[derive(Debug, Serialize)]
pub struct EarningsByDay {
    pub days: Vec<String>,
    pub amounts: Vec<Decimal>,
}
