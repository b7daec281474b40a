//! Timestamped cache records.

use std::time::Duration;

use time::OffsetDateTime;

/// Which tier a cached dataset was last loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    Durable,
    Remote,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Durable => "durable",
            Self::Remote => "remote",
        }
    }
}

/// One cached dataset: an ordered payload plus freshness metadata.
///
/// Records are overwritten wholesale on refresh, never patched. A record is
/// valid iff `now - fetched_at < ttl`; an expired record must not be served
/// without refreshing from a lower tier.
#[derive(Debug, Clone)]
pub struct CacheRecord<T> {
    pub items: Vec<T>,
    pub fetched_at: OffsetDateTime,
    pub ttl: Duration,
    pub source: CacheSource,
}

impl<T> CacheRecord<T> {
    pub fn new(
        items: Vec<T>,
        fetched_at: OffsetDateTime,
        ttl: Duration,
        source: CacheSource,
    ) -> Self {
        Self {
            items,
            fetched_at,
            ttl,
            source,
        }
    }

    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        let age = now - self.fetched_at;
        age.whole_milliseconds() < self.ttl.as_millis() as i128
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop freshness while retaining the payload, so a stale-but-displayable
    /// view persists until the next refresh.
    pub fn invalidate(&mut self) {
        self.ttl = Duration::ZERO;
    }

    pub fn age_at(&self, now: OffsetDateTime) -> Duration {
        let age = now - self.fetched_at;
        Duration::try_from(age).unwrap_or(Duration::ZERO)
    }
}
