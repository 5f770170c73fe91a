//! Rate data: the upstream API client, the backward-walking lookup, and the
//! runtime caches in front of them.

pub mod bcv;
pub mod cache;
pub mod lookup;

pub use bcv::{BcvClient, FetchError, RateEntry, RateSource};
pub use cache::{CachedRateSource, CurrentRateCache};
pub use lookup::{MAX_LOOKUP_ATTEMPTS, RateLookup};
