//! Latest-wins debouncing for filter input.
//!
//! Keystroke-rate criteria changes are coalesced into at most one filter
//! application per quiet window. A newer submission aborts the pending one,
//! so the state store only ever reflects the latest criteria.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::orchestrator::CacheOrchestrator;
use crate::domain::filter::FilterCriteria;

pub struct FilterDebouncer {
    orchestrator: Arc<CacheOrchestrator>,
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl FilterDebouncer {
    pub fn new(orchestrator: Arc<CacheOrchestrator>, window: Duration) -> Self {
        Self {
            orchestrator,
            window,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `criteria` to be applied after one quiet window, replacing
    /// any not-yet-fired submission.
    pub fn submit(&self, criteria: FilterCriteria) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let window = self.window;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;

            match orchestrator.filter_locally(&criteria) {
                Ok(results) => {
                    debug!(results = results.len(), "Debounced filter applied");
                }
                Err(err) if err.is_no_valid_cache() => {
                    // Cold or expired cache: fall through to the full chain.
                    if let Err(err) = orchestrator.ensure_poems(&criteria, false).await {
                        warn!(error = %err, "Debounced fetch failed");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Debounced filter failed");
                }
            }
        });

        if let Some(previous) = self.slot().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending submission, if any, without applying it.
    pub fn cancel(&self) {
        if let Some(handle) = self.slot().take() {
            handle.abort();
        }
    }

    // The slot holds only an abort handle, so a guard poisoned by a panicked
    // submitter can be reused as-is.
    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| {
            warn!("Debounce slot mutex poisoned; reusing pending handle");
            poisoned.into_inner()
        })
    }
}

impl Drop for FilterDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
