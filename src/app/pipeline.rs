//! Wiring shared by every subcommand:
//! settings -> HTTP client -> runtime cache -> lookup -> calculator.

use crate::config::Settings;
use crate::data::{BcvClient, CachedRateSource, CurrentRateCache, RateLookup};
use crate::error::AppError;
use crate::invoice::InvoiceCalculator;

/// The production calculator: live API behind the in-memory cache.
///
/// The caches live as long as the calculator. Each `bcv` invocation builds a
/// fresh one and runs a single command, so the CLI never serves cached or
/// offline data; only long-lived library callers benefit from them.
pub type LiveCalculator = InvoiceCalculator<CachedRateSource<BcvClient>>;

pub fn build_calculator(settings: &Settings) -> Result<LiveCalculator, AppError> {
    let client = BcvClient::new(settings.api_base_url.clone(), settings.http_timeout)?;
    let lookup = RateLookup::new(CachedRateSource::new(client));
    Ok(InvoiceCalculator::new(
        lookup,
        settings.holidays.clone(),
        CurrentRateCache::new(settings.current_rate_max_age),
    ))
}
