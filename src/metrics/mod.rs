//! Prometheus metrics for the storefront
//!
//! - HTTP request count / duration / in-flight
//! - Click ledger counters (recorded vs deduplicated)
//! - Order attribution and earning-approval counters
//! - Withdrawal request counter

#![allow(dead_code)]

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Metric names as constants for consistency
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";

    pub const CLICKS_RECORDED_TOTAL: &str = "clicks_recorded_total";
    pub const CLICKS_DEDUPLICATED_TOTAL: &str = "clicks_deduplicated_total";

    pub const ORDERS_PLACED_TOTAL: &str = "orders_placed_total";
    pub const ORDERS_ATTRIBUTED_TOTAL: &str = "orders_attributed_total";

    pub const EARNINGS_APPROVED_TOTAL: &str = "earnings_approved_total";
    pub const EARNINGS_REJECTED_TOTAL: &str = "earnings_rejected_total";
    pub const COMMISSION_CREDITED: &str = "commission_credited";

    pub const WITHDRAW_REQUESTS_TOTAL: &str = "withdraw_requests_total";

    pub const NOTIFICATIONS_FAILED_TOTAL: &str = "notifications_failed_total";
}

/// Label keys
pub mod labels {
    pub const METHOD: &str = "method";
    pub const ENDPOINT: &str = "endpoint";
    pub const STATUS: &str = "status";
    pub const DEVICE: &str = "device";
    pub const TIER: &str = "tier";
    pub const KIND: &str = "kind";
}

/// Install the Prometheus recorder and return the render handle.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(names::HTTP_REQUEST_DURATION_SECONDS.to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )
        .unwrap()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    counter!(
        names::HTTP_REQUESTS_TOTAL,
        labels::METHOD => method.to_string(),
        labels::ENDPOINT => endpoint.to_string(),
        labels::STATUS => status_str.clone()
    )
    .increment(1);

    histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        labels::METHOD => method.to_string(),
        labels::ENDPOINT => endpoint.to_string(),
        labels::STATUS => status_str
    )
    .record(duration_secs);
}

pub fn set_http_requests_in_flight(delta: i64) {
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(delta as f64);
}

pub fn record_click(device: &str) {
    counter!(
        names::CLICKS_RECORDED_TOTAL,
        labels::DEVICE => device.to_string()
    )
    .increment(1);
}

pub fn record_click_deduplicated() {
    counter!(names::CLICKS_DEDUPLICATED_TOTAL).increment(1);
}

pub fn record_order_placed(attributed: bool) {
    counter!(names::ORDERS_PLACED_TOTAL).increment(1);
    if attributed {
        counter!(names::ORDERS_ATTRIBUTED_TOTAL).increment(1);
    }
}

pub fn record_earning_approved(tier: &str, amount: f64) {
    counter!(
        names::EARNINGS_APPROVED_TOTAL,
        labels::TIER => tier.to_string()
    )
    .increment(1);
    counter!(names::COMMISSION_CREDITED).increment(amount as u64);
}

pub fn record_earning_rejected() {
    counter!(names::EARNINGS_REJECTED_TOTAL).increment(1);
}

pub fn record_withdraw_request() {
    counter!(names::WITHDRAW_REQUESTS_TOTAL).increment(1);
}

pub fn record_notification_failure(kind: &str) {
    counter!(
        names::NOTIFICATIONS_FAILED_TOTAL,
        labels::KIND => kind.to_string()
    )
    .increment(1);
}
