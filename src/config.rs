use std::env;
use std::time::Duration;

use crate::services::calendar::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub webhook_url: String,
    pub remote_source_url: String,
    pub poll_interval_secs: u64,
    pub booking_window_days: u32,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "edgebook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "admin123".to_string()),
            webhook_url: env::var("WEBHOOK_URL").unwrap_or_default(),
            remote_source_url: env::var("REMOTE_SOURCE_URL").unwrap_or_default(),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(5),
            booking_window_days: window_days(env::var("BOOKING_WINDOW_DAYS").ok().as_deref()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Parses the public booking window, clamped to `1..=MAX_WINDOW_DAYS`.
fn window_days(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .map(|days| days.clamp(1, MAX_WINDOW_DAYS))
        .unwrap_or(DEFAULT_WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days_is_clamped() {
        assert_eq!(window_days(None), DEFAULT_WINDOW_DAYS);
        assert_eq!(window_days(Some("30")), 30);
        assert_eq!(window_days(Some("0")), 1);
        assert_eq!(window_days(Some("4294967295")), MAX_WINDOW_DAYS);
        assert_eq!(window_days(Some("soon")), DEFAULT_WINDOW_DAYS);
    }
}
