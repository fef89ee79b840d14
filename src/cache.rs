//! Time-bound cache in front of one source adapter.
//!
//! A [`FeedCache`] serves its hazard type's last successful fetch for
//! [`FEED_TTL_SECS`] and refreshes it afterwards.
//!
//! # Guarantees
//!
//! - **Single flight**: at most one upstream fetch per cache is in flight.
//!   Callers arriving during a refresh wait for it and share its outcome.
//! - **Wholesale replacement**: a successful refresh replaces the whole list.
//!   Upstream feeds have no stable identity to merge on.
//! - **Monotonic writes**: an entry is never replaced by one whose fetch
//!   started earlier.
//! - **Detached refresh**: the fetch runs in its own task, so a caller that
//!   gives up does not cancel it; the result still lands in the cache.
//!
//! # Failure policy
//!
//! On a failed refresh the entry is left untouched. By default the caller
//! receives an empty list ([`FailurePolicy::ServeEmpty`]), not the stale entry.
//! [`FailurePolicy::ServeStale`] opts into serving the last good list instead.
//! Failures are not cached: the next call retries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::clock::Clock;
use crate::data_sources::SourceAdapter;
use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, MAX_EVENTS_PER_FETCH};

/// Freshness window, identical for every hazard type.
pub const FEED_TTL_SECS: i64 = 600;

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a caller receives when a refresh fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return an empty list.
    #[default]
    ServeEmpty,
    /// Return the last successful list, if any.
    ServeStale,
}

/// Tunables shared by every feed cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Upper bound on one upstream fetch.
    pub timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            failure_policy: FailurePolicy::ServeEmpty,
        }
    }
}

/// The last successful fetch for one hazard type.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Normalized, capped, unclassified events in upstream order.
    pub events: Vec<HazardEvent>,

    /// Clock reading when the fetch that produced `events` started.
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// State guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshState {
    last_ok: bool,
}

struct Inner {
    hazard_type: HazardType,
    adapter: Arc<dyn SourceAdapter>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    settings: CacheSettings,
    entry: RwLock<Option<CacheEntry>>,
    refresh: Arc<Mutex<RefreshState>>,
    /// Completed refresh attempts. Only written while holding `refresh`.
    attempts: AtomicU64,
}

/// TTL cache wrapping one source adapter.
#[derive(Clone)]
pub struct FeedCache {
    inner: Arc<Inner>,
}

impl FeedCache {
    pub fn new(
        adapter: Arc<dyn SourceAdapter>,
        clock: Arc<dyn Clock>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                hazard_type: adapter.hazard_type(),
                adapter,
                clock,
                ttl: chrono::Duration::seconds(FEED_TTL_SECS),
                settings,
                entry: RwLock::new(None),
                refresh: Arc::new(Mutex::new(RefreshState::default())),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn hazard_type(&self) -> HazardType {
        self.inner.hazard_type
    }

    /// Return the cached list if fresh, otherwise refresh it.
    ///
    /// Never fails: a failed refresh yields the failure policy's result.
    pub async fn get_or_fetch(&self) -> Vec<HazardEvent> {
        let seen = self.inner.attempts.load(Ordering::SeqCst);

        if let Some(events) = self.inner.fresh_events().await {
            debug!(hazard = %self.hazard_type(), "Cache hit");
            return events;
        }

        let state = Arc::clone(&self.inner.refresh).lock_owned().await;

        // Another caller finished a refresh while we waited: share its outcome.
        if self.inner.attempts.load(Ordering::SeqCst) != seen {
            return if state.last_ok {
                self.inner.current_events().await
            } else {
                self.inner.failure_result().await
            };
        }
        if let Some(events) = self.inner.fresh_events().await {
            return events;
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut state = state;
            let outcome = inner.refresh().await;
            state.last_ok = outcome.is_ok();
            inner.attempts.fetch_add(1, Ordering::SeqCst);
            outcome
        });

        match task.await {
            Ok(Ok(events)) => events,
            Ok(Err(_)) => self.inner.failure_result().await,
            Err(e) => {
                error!(hazard = %self.hazard_type(), error = %e, "Refresh task failed");
                self.inner.failure_result().await
            }
        }
    }

    /// The last committed list, fresh or not, without fetching.
    pub async fn snapshot(&self) -> Option<CacheEntry> {
        self.inner.entry.read().await.clone()
    }
}

impl Inner {
    async fn fresh_events(&self) -> Option<Vec<HazardEvent>> {
        let now = self.clock.now();
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.events.clone())
    }

    async fn current_events(&self) -> Vec<HazardEvent> {
        self.entry
            .read()
            .await
            .as_ref()
            .map(|entry| entry.events.clone())
            .unwrap_or_default()
    }

    async fn failure_result(&self) -> Vec<HazardEvent> {
        match self.settings.failure_policy {
            FailurePolicy::ServeEmpty => Vec::new(),
            FailurePolicy::ServeStale => self.current_events().await,
        }
    }

    /// Call the adapter once and commit the result on success.
    #[instrument(skip(self), fields(hazard = %self.hazard_type))]
    async fn refresh(&self) -> Result<Vec<HazardEvent>, FetchError> {
        let started_at = self.clock.now();
        let timeout = self.settings.timeout;

        let result = tokio::time::timeout(timeout, self.adapter.fetch(timeout))
            .await
            .unwrap_or(Err(FetchError::Timeout));

        match result {
            Ok(mut events) => {
                let fetched = events.len();
                events.retain(|e| e.hazard_type() == self.hazard_type);
                if events.len() != fetched {
                    warn!(
                        dropped = fetched - events.len(),
                        "Adapter returned events of another hazard type"
                    );
                }
                events.truncate(MAX_EVENTS_PER_FETCH);

                info!(count = events.len(), "Feed refreshed");
                Ok(self.commit(events, started_at).await)
            }
            Err(e) => {
                warn!(error = %e, "Feed refresh failed");
                Err(e)
            }
        }
    }

    /// Replace the entry unless a newer one is already committed. Returns the
    /// list that is current afterwards.
    async fn commit(
        &self,
        events: Vec<HazardEvent>,
        fetched_at: DateTime<Utc>,
    ) -> Vec<HazardEvent> {
        let mut entry = self.entry.write().await;

        if let Some(existing) = entry.as_ref() {
            if existing.fetched_at > fetched_at {
                debug!(
                    existing = %existing.fetched_at,
                    rejected = %fetched_at,
                    "Discarding refresh older than committed entry"
                );
                return existing.events.clone();
            }
        }

        *entry = Some(CacheEntry {
            events: events.clone(),
            fetched_at,
        });
        events
    }
}
