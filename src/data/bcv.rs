//! HTTP client for the public BCV exchange-rate API (api.dolarvzla.com).
//!
//! Two read-only endpoints:
//! - `/public/exchange-rate`: the current rate snapshot
//! - `/public/exchange-rate/list?from=..&to=..`: rates published in a date range

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.dolarvzla.com";

const CURRENT_PATH: &str = "/public/exchange-rate";
const LIST_PATH: &str = "/public/exchange-rate/list";

/// One rate entry as published upstream.
///
/// `usd` is `None` when the upstream value was missing or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEntry {
    pub usd: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

impl RateEntry {
    /// The rate, if it is usable for pricing (strictly positive).
    pub fn usable_rate(&self) -> Option<Decimal> {
        self.usd.filter(|rate| *rate > Decimal::ZERO)
    }
}

/// A single failed request to the rate service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, timeout, TLS...
    Transport(String),
    /// Non-success HTTP status.
    Status(u16),
    /// Body was not the expected JSON.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "request failed: {msg}"),
            FetchError::Status(status) => write!(f, "HTTP status {status}"),
            FetchError::Decode(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Where published rates come from.
///
/// Implemented by the HTTP client, by the caching wrapper, and by in-memory
/// sources in tests.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Entries published for exactly `date` (a single-day range query).
    async fn rates_for_date(&self, date: NaiveDate) -> Result<Vec<RateEntry>, FetchError>;

    /// The upstream "current rate" snapshot.
    async fn current_rate(&self) -> Result<RateEntry, FetchError>;
}

pub struct BcvClient {
    client: Client,
    base_url: String,
}

impl BcvClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        resp.json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RateSource for BcvClient {
    async fn rates_for_date(&self, date: NaiveDate) -> Result<Vec<RateEntry>, FetchError> {
        let day = date.to_string();
        let body: ListResponse = self
            .get_json(LIST_PATH, &[("from", day.clone()), ("to", day)])
            .await?;
        Ok(body.rates.into_iter().map(RawEntry::into_entry).collect())
    }

    async fn current_rate(&self) -> Result<RateEntry, FetchError> {
        let body: CurrentResponse = self.get_json(CURRENT_PATH, &[]).await?;
        body.current
            .map(RawEntry::into_entry)
            .ok_or_else(|| FetchError::Decode("missing 'current' object".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    rates: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    usd: Option<serde_json::Value>,
    #[serde(default)]
    date: Option<String>,
}

impl RawEntry {
    fn into_entry(self) -> RateEntry {
        RateEntry {
            usd: self.usd.as_ref().and_then(parse_rate),
            date: self
                .date
                .as_deref()
                .and_then(|raw| NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()),
        }
    }
}

/// Rates arrive either as JSON numbers or numeric strings.
fn parse_rate(value: &serde_json::Value) -> Option<Decimal> {
    let raw = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}
