//! Pure per-path debounce timing. No filesystem access, no dispatch.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Coalesces bursts of events per path: every event for a path re-arms that
/// path's deadline, and a path fires once its own quiet period elapses.
/// Deadlines are independent, so a busy path never delays an already-quiet
/// one.
pub struct Debouncer {
    window: Duration,
    pending: FxHashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: FxHashMap::default(),
        }
    }

    /// Record an event for `path`, (re)arming its deadline.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now() + self.window);
    }

    /// Cancel a pending path (teardown or explicit abort).
    pub fn cancel(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Take every path whose quiet period has elapsed.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.pending.remove(path);
        }
        ready
    }

    /// Sleep duration until the earliest pending deadline.
    pub fn sleep_duration(&self) -> Duration {
        let Some(earliest) = self.pending.values().min() else {
            return Duration::from_secs(86400);
        };
        earliest
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(1))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
