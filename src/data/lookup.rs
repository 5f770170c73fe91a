//! Published-rate lookup with a bounded backward walk.
//!
//! The rate service has no data for weekends, holidays or outages. Starting at
//! the requested date we probe one day at a time, backwards, and return the
//! first day that has a usable rate. The walk is capped at a week.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::data::bcv::RateSource;
use crate::domain::RateQuote;
use crate::error::CalcError;

/// Total probes per lookup, the requested date included.
pub const MAX_LOOKUP_ATTEMPTS: u32 = 7;

pub struct RateLookup<S> {
    source: S,
}

impl<S: RateSource> RateLookup<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Rate published for `target`, or for the closest earlier day that has one.
    ///
    /// Failed requests and empty days both consume one attempt and move the
    /// probe back a day. Probes are sequential.
    pub async fn lookup(&self, target: NaiveDate) -> Result<RateQuote, CalcError> {
        let unavailable = CalcError::RateUnavailable {
            requested: target,
            attempts: MAX_LOOKUP_ATTEMPTS,
        };

        let mut date = target;
        for attempt in 1..=MAX_LOOKUP_ATTEMPTS {
            debug!(%date, attempt, "probing BCV rate");

            match self.source.rates_for_date(date).await {
                Ok(entries) => {
                    if let Some(rate) = entries.iter().find_map(|e| e.usable_rate()) {
                        info!(requested = %target, published = %date, %rate, "resolved BCV rate");
                        return Ok(RateQuote::new(rate, date));
                    }
                    debug!(%date, "no rate published");
                }
                Err(err) => {
                    warn!(%date, attempt, error = %err, "BCV rate request failed");
                }
            }

            date = match date.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        Err(unavailable)
    }

    /// The upstream "current rate" snapshot, dated by its publication date when
    /// the service reports one, else by `fallback_date`.
    pub async fn current_snapshot(&self, fallback_date: NaiveDate) -> Result<RateQuote, CalcError> {
        let unavailable = CalcError::RateUnavailable {
            requested: fallback_date,
            attempts: 1,
        };

        match self.source.current_rate().await {
            Ok(entry) => match entry.usable_rate() {
                Some(rate) => Ok(RateQuote::new(rate, entry.date.unwrap_or(fallback_date))),
                None => {
                    warn!("current BCV rate response had no usable rate");
                    Err(unavailable)
                }
            },
            Err(err) => {
                warn!(error = %err, "current BCV rate request failed");
                Err(unavailable)
            }
        }
    }
}
