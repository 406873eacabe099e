//! Request sequencing for record fetches
//!
//! Every fetch takes a token before it starts. When the response arrives the
//! snapshot only accepts it if no newer fetch has been started since; an
//! older response arriving late is dropped instead of overwriting fresher
//! data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Issues monotonically increasing request tokens
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
}

/// Ticket for one in-flight fetch
#[derive(Debug, Clone)]
pub struct RequestToken {
    seq: u64,
    latest: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier token
    pub fn issue(&self) -> RequestToken {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken {
            seq,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Sequence number of the newest token
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

impl RequestToken {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// True while no newer token has been issued
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.seq
    }
}

/// The records currently shown, replaced wholesale by each accepted fetch
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    items: Vec<T>,
    applied: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            applied: 0,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held items with `data` if `token` is still the latest
    /// request. Returns whether the data was applied.
    pub fn apply(&mut self, token: &RequestToken, data: Vec<T>) -> bool {
        if !token.is_current() || token.seq <= self.applied {
            debug!(
                token = token.seq,
                applied = self.applied,
                "discarding stale fetch response"
            );
            return false;
        }

        self.items = data;
        self.applied = token.seq;
        true
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Sequence number of the response currently held, 0 before any fetch
    pub fn applied_seq(&self) -> u64 {
        self.applied
    }

    pub fn is_loaded(&self) -> bool {
        self.applied > 0
    }
}
