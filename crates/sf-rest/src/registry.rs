//! Registry of in-flight queries, keyed by caller-supplied id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::query::QueryProgress;

#[derive(Debug)]
struct Entry {
    generation: u64,
    token: CancellationToken,
    last: Option<QueryProgress>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    generations: AtomicU64,
}

/// Tracks the cancellation token and last progress of each running query.
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryRegistry {
    inner: Arc<Inner>,
}

impl QueryRegistry {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a new query. A live query under the same id is cancelled and
    /// replaced.
    pub(crate) fn register(&self, query_id: &str) -> TrackedQuery {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self.entries().insert(
            query_id.to_string(),
            Entry {
                generation,
                token: token.clone(),
                last: None,
            },
        );
        if let Some(previous) = previous {
            debug!(query_id, "Replacing in-flight query with the same id");
            previous.token.cancel();
        }
        TrackedQuery {
            registry: self.clone(),
            query_id: query_id.to_string(),
            generation,
            token,
        }
    }

    /// Cancel and forget a query. False if it is not tracked.
    pub(crate) fn abort(&self, query_id: &str) -> bool {
        match self.entries().remove(query_id) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self, query_id: &str) -> Option<QueryProgress> {
        self.entries().get(query_id).and_then(|e| e.last.clone())
    }

    #[cfg(test)]
    pub(crate) fn is_tracked(&self, query_id: &str) -> bool {
        self.entries().contains_key(query_id)
    }

    pub(crate) fn tracked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Cancel every tracked query.
    pub(crate) fn abort_all(&self) {
        for (_, entry) in self.entries().drain() {
            entry.token.cancel();
        }
    }
}

/// Registration handle owned by a running query. Dropping it removes the
/// entry unless a newer query has taken over the id.
#[derive(Debug)]
pub(crate) struct TrackedQuery {
    registry: QueryRegistry,
    query_id: String,
    generation: u64,
    token: CancellationToken,
}

impl TrackedQuery {
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn record(&self, progress: &QueryProgress) {
        if let Some(entry) = self.registry.entries().get_mut(&self.query_id) {
            if entry.generation == self.generation {
                entry.last = Some(progress.clone());
            }
        }
    }
}

impl Drop for TrackedQuery {
    fn drop(&mut self) {
        let mut entries = self.registry.entries();
        if entries
            .get(&self.query_id)
            .is_some_and(|e| e.generation == self.generation)
        {
            entries.remove(&self.query_id);
        }
    }
}
