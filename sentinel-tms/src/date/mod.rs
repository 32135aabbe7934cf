//! Latest-available-date resolution per zone.
//!
//! Finding the most recent product of a zone costs one availability probe per
//! day walked back, so the answer is cached per zone and refreshed at most
//! once per calendar day.
//!
//! Concurrent callers racing on a stale zone may each query the provider; the
//! lookup is idempotent and the last write wins.
//!
//! # Example
//!
//! ```ignore
//! use sentinel_tms::date::DateResolver;
//!
//! let resolver = DateResolver::new(provider);
//! let date = resolver.resolve("31TCJ")?;
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::provider::ProductProvider;
use crate::tile::TileError;

/// Cached lookup result for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCacheEntry {
    /// Day the provider was last asked.
    pub refreshed_on: NaiveDate,
    /// Provider answer on that day.
    pub date: Option<NaiveDate>,
}

/// Per-zone, per-day cache of the latest product date.
pub struct DateResolver {
    provider: Arc<dyn ProductProvider>,
    cache: DashMap<String, DateCacheEntry>,
}

impl DateResolver {
    pub fn new(provider: Arc<dyn ProductProvider>) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
        }
    }

    /// Resolves the latest date for `zone` as of the local calendar day.
    ///
    /// Blocking: a stale entry triggers provider I/O.
    pub fn resolve(&self, zone: &str) -> Result<NaiveDate, TileError> {
        self.resolve_on(zone, Local::now().date_naive())
    }

    /// Resolves the latest date for `zone` as of `today`.
    pub fn resolve_on(&self, zone: &str, today: NaiveDate) -> Result<NaiveDate, TileError> {
        let cached = self
            .cache
            .get(zone)
            .map(|entry| *entry)
            .filter(|entry| entry.refreshed_on == today);

        let entry = match cached {
            Some(entry) => {
                debug!(zone, date = ?entry.date, "Date cache hit");
                entry
            }
            None => {
                let date = self.provider.last_available_date(zone);
                info!(zone, date = ?date, "Resolved latest product date");
                let entry = DateCacheEntry {
                    refreshed_on: today,
                    date,
                };
                self.cache.insert(zone.to_string(), entry);
                entry
            }
        };

        entry
            .date
            .ok_or_else(|| TileError::NoDateFound(zone.to_string()))
    }

    /// Current cache entry for `zone`, if any.
    pub fn cached(&self, zone: &str) -> Option<DateCacheEntry> {
        self.cache.get(zone).map(|entry| *entry)
    }
}
