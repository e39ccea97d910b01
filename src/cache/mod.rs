//! In-process TTL cache for API responses.
//!
//! Entries carry their own expiry and are evicted lazily: a `get` that finds a
//! stale entry removes it and reports a miss. Time comes from a [`Clock`], so
//! tests can drive expiry without sleeping.

mod clock;
mod store;


#[cfg(test)]
pub(crate) use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use store::{DEFAULT_TTL_MS, TtlCache};
