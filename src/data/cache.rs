//! Runtime (in-memory) caching for rate data.
//!
//! - `CachedRateSource`: network first; the last good response for the same
//!   request is served only when the network call fails.
//! - `CurrentRateCache`: one time-stamped slot for the rate in force "now".
//!
//! Nothing here is persisted; a fresh process starts with empty caches. The
//! one-shot `bcv` binary therefore gets no offline fallback or current-rate
//! reuse from them; they pay off for callers that keep a calculator alive
//! across several calculations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::data::bcv::{FetchError, RateEntry, RateSource};
use crate::domain::RateQuote;

pub struct CachedRateSource<S> {
    inner: S,
    by_date: Mutex<HashMap<NaiveDate, Vec<RateEntry>>>,
    current: Mutex<Option<RateEntry>>,
}

impl<S: RateSource> CachedRateSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            by_date: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn cached_for(&self, date: NaiveDate) -> Option<Vec<RateEntry>> {
        self.by_date.lock().ok()?.get(&date).cloned()
    }

    fn store_for(&self, date: NaiveDate, entries: &[RateEntry]) {
        if let Ok(mut map) = self.by_date.lock() {
            map.insert(date, entries.to_vec());
        }
    }
}

#[async_trait]
impl<S: RateSource> RateSource for CachedRateSource<S> {
    async fn rates_for_date(&self, date: NaiveDate) -> Result<Vec<RateEntry>, FetchError> {
        match self.inner.rates_for_date(date).await {
            Ok(entries) => {
                self.store_for(date, &entries);
                Ok(entries)
            }
            Err(err) => match self.cached_for(date) {
                Some(entries) => {
                    warn!(%date, error = %err, "rate service unreachable, serving cached rates");
                    Ok(entries)
                }
                None => Err(err),
            },
        }
    }

    async fn current_rate(&self) -> Result<RateEntry, FetchError> {
        match self.inner.current_rate().await {
            Ok(entry) => {
                if let Ok(mut slot) = self.current.lock() {
                    *slot = Some(entry);
                }
                Ok(entry)
            }
            Err(err) => {
                let cached = self.current.lock().ok().and_then(|slot| *slot);
                match cached {
                    Some(entry) => {
                        warn!(error = %err, "rate service unreachable, serving cached current rate");
                        Ok(entry)
                    }
                    None => Err(err),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CurrentSlot {
    effective_date: NaiveDate,
    quote: RateQuote,
    fetched_at: Instant,
}

/// Time-stamped "rate in force now".
///
/// A stored quote is reused only for the same effective date and while it is
/// younger than `max_age`. Writes overwrite the slot; the last writer wins.
#[derive(Debug)]
pub struct CurrentRateCache {
    max_age: Duration,
    slot: Mutex<Option<CurrentSlot>>,
}

impl CurrentRateCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self, effective_date: NaiveDate) -> Option<RateQuote> {
        self.get_at(effective_date, Instant::now())
    }

    pub fn put(&self, effective_date: NaiveDate, quote: RateQuote) {
        self.put_at(effective_date, quote, Instant::now());
    }

    fn get_at(&self, effective_date: NaiveDate, now: Instant) -> Option<RateQuote> {
        let slot = (*self.slot.lock().ok()?)?;
        let fresh = now.saturating_duration_since(slot.fetched_at) < self.max_age;
        (slot.effective_date == effective_date && fresh).then_some(slot.quote)
    }

    fn put_at(&self, effective_date: NaiveDate, quote: RateQuote, now: Instant) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(CurrentSlot {
                effective_date,
                quote,
                fetched_at: now,
            });
        }
    }
}
