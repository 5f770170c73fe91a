//! Runtime settings, read from the environment (and `.env` if present).
//!
//! * `BCV_API_BASE_URL` - rate service base URL (default: https://api.dolarvzla.com)
//! * `BCV_HTTP_TIMEOUT_SECS` - per-request timeout (default: 10)
//! * `BCV_HOLIDAYS` - comma-separated ISO dates treated as bank holidays
//! * `BCV_HOLIDAYS_FILE` - JSON array of ISO dates, merged with `BCV_HOLIDAYS`
//! * `BCV_CURRENT_RATE_MAX_AGE_SECS` - how long a "current rate" stays reusable (default: 600)
//! * `BCV_LOG` / `RUST_LOG` - tracing filter (default: warn)

use std::path::Path;
use std::time::Duration;

use crate::data::bcv::DEFAULT_BASE_URL;
use crate::domain::HolidaySet;
use crate::error::AppError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CURRENT_RATE_MAX_AGE_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub holidays: HolidaySet,
    pub current_rate_max_age: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            holidays: HolidaySet::default(),
            current_rate_max_age: Duration::from_secs(DEFAULT_CURRENT_RATE_MAX_AGE_SECS),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Settings::default();

        if let Some(url) = get("BCV_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            settings.api_base_url = url.trim().to_string();
        }
        if let Some(secs) = get("BCV_HTTP_TIMEOUT_SECS") {
            settings.http_timeout = Duration::from_secs(parse_secs("BCV_HTTP_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("BCV_CURRENT_RATE_MAX_AGE_SECS") {
            settings.current_rate_max_age =
                Duration::from_secs(parse_secs("BCV_CURRENT_RATE_MAX_AGE_SECS", &secs)?);
        }
        if let Some(list) = get("BCV_HOLIDAYS") {
            settings.holidays = HolidaySet::parse_list(&list)?;
        }
        if let Some(path) = get("BCV_HOLIDAYS_FILE").filter(|v| !v.trim().is_empty()) {
            let from_file = HolidaySet::from_json_file(Path::new(path.trim()))?;
            settings.holidays = settings.holidays.merged(from_file);
        }

        Ok(settings)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| AppError::new(2, format!("Invalid {key} '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.http_timeout, Duration::from_secs(10));
        assert!(settings.holidays.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("BCV_API_BASE_URL", "http://localhost:9000"),
            ("BCV_HTTP_TIMEOUT_SECS", "3"),
            ("BCV_CURRENT_RATE_MAX_AGE_SECS", "60"),
            ("BCV_HOLIDAYS", "2025-01-01,2025-01-06"),
        ]))
        .unwrap();

        assert_eq!(settings.api_base_url, "http://localhost:9000");
        assert_eq!(settings.http_timeout, Duration::from_secs(3));
        assert_eq!(settings.current_rate_max_age, Duration::from_secs(60));
        assert!(settings.holidays.contains(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()));
    }

    #[test]
    fn merges_holiday_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feriados.json");
        std::fs::write(&path, r#"["2025-07-05"]"#).unwrap();
        let path = path.to_string_lossy().to_string();

        let settings = Settings::from_lookup(lookup(&[
            ("BCV_HOLIDAYS", "2025-01-01"),
            ("BCV_HOLIDAYS_FILE", path.as_str()),
        ]))
        .unwrap();
        assert_eq!(settings.holidays.len(), 2);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Settings::from_lookup(lookup(&[("BCV_HTTP_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
