//! Bounded buffers of recently streamed console and network activity.
//!
//! While the bridge connection is up, streamed events are recorded here so
//! that a failed batch request can still be answered from local data — the
//! "buffered recent" soft-fallback. Buffers are FIFO with front eviction
//! and also track how many items were ever seen, so fallback snapshots can
//! report an honest upstream total.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use vigil_core::{ConsoleEntry, NetworkEntry, MAX_CONSOLE_ENTRIES, MAX_NETWORK_EVENTS};

/// A recent-entries snapshot: the retained items plus the total ever seen.
pub type Snapshot<T> = (Vec<T>, usize);

#[derive(Debug)]
struct Inner {
    console: VecDeque<ConsoleEntry>,
    network: VecDeque<NetworkEntry>,
    console_seen: usize,
    network_seen: usize,
    console_cap: usize,
    network_cap: usize,
}

/// Thread-safe rolling buffers of recent bridge events.
///
/// Clonable handle; all clones share the same storage. The event pump
/// records into it while capture panels read snapshots from it.
#[derive(Debug, Clone)]
pub struct RecentBuffer {
    inner: Arc<Mutex<Inner>>,
}

impl Default for RecentBuffer {
    fn default() -> Self {
        Self::new(MAX_CONSOLE_ENTRIES, MAX_NETWORK_EVENTS)
    }
}

impl RecentBuffer {
    /// Create buffers with explicit retention caps.
    pub fn new(console_cap: usize, network_cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                console: VecDeque::new(),
                network: VecDeque::new(),
                console_seen: 0,
                network_seen: 0,
                console_cap,
                network_cap,
            })),
        }
    }

    /// Record one streamed console entry, evicting the oldest if over cap.
    pub fn record_console(&self, entry: ConsoleEntry) {
        let mut inner = self.lock();
        inner.console_seen += 1;
        inner.console.push_back(entry);
        while inner.console.len() > inner.console_cap {
            inner.console.pop_front();
        }
    }

    /// Record one streamed network event, evicting the oldest if over cap.
    pub fn record_network(&self, entry: NetworkEntry) {
        let mut inner = self.lock();
        inner.network_seen += 1;
        inner.network.push_back(entry);
        while inner.network.len() > inner.network_cap {
            inner.network.pop_front();
        }
    }

    /// Snapshot of retained console entries and the total ever seen.
    pub fn recent_logs(&self) -> Snapshot<ConsoleEntry> {
        let inner = self.lock();
        (inner.console.iter().cloned().collect(), inner.console_seen)
    }

    /// Snapshot of retained network events and the total ever seen.
    pub fn recent_network_events(&self) -> Snapshot<NetworkEntry> {
        let inner = self.lock();
        (inner.network.iter().cloned().collect(), inner.network_seen)
    }

    /// Drop all buffered data and reset the seen counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.console.clear();
        inner.network.clear();
        inner.console_seen = 0;
        inner.network_seen = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
