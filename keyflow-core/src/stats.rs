use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Counters written by the hook thread and read from anywhere.
///
/// Each counter is individually atomic; a snapshot is not a consistent cut
/// across all of them.
#[derive(Debug)]
pub struct Statistics {
    enabled: AtomicBool,
    events_processed: AtomicU64,
    shortcuts_triggered: AtomicU64,
    /// Milliseconds since the unix epoch, 0 when no event was seen yet.
    last_event: AtomicU64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Statistics {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            events_processed: AtomicU64::new(0),
            shortcuts_triggered: AtomicU64::new(0),
            last_event: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        if !self.is_enabled() {
            return;
        }
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        self.last_event.store(now_millis(), Ordering::Relaxed);
    }

    pub fn record_trigger(&self) {
        if self.is_enabled() {
            self.shortcuts_triggered.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn shortcuts_triggered(&self) -> u64 {
        self.shortcuts_triggered.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn last_event(&self) -> Option<u64> {
        match self.last_event.load(Ordering::Relaxed) {
            0 => None,
            millis => Some(millis),
        }
    }

    pub fn reset(&self) {
        self.events_processed.store(0, Ordering::Relaxed);
        self.shortcuts_triggered.store(0, Ordering::Relaxed);
        self.last_event.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of the service, handed to the control side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub enabled: bool,
    pub hooked: bool,
    pub registered_count: usize,
    pub events_processed: u64,
    pub shortcuts_triggered: u64,
    /// Milliseconds since the unix epoch.
    pub last_event_timestamp: Option<u64>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::Statistics;

    #[test]
    fn counts_when_enabled() {
        let stats = Statistics::new(true);
        assert_eq!(stats.last_event(), None);
        stats.record_event();
        stats.record_event();
        stats.record_trigger();
        assert_eq!(stats.events_processed(), 2);
        assert_eq!(stats.shortcuts_triggered(), 1);
        assert!(stats.last_event().is_some());
    }

    #[test]
    fn ignores_when_disabled() {
        let stats = Statistics::new(false);
        stats.record_event();
        stats.record_trigger();
        assert_eq!(stats.events_processed(), 0);
        assert_eq!(stats.shortcuts_triggered(), 0);
        assert_eq!(stats.last_event(), None);
    }

    #[test]
    fn reset_zeroes_counters() {
        let stats = Statistics::default();
        stats.record_event();
        stats.reset();
        assert_eq!(stats.events_processed(), 0);
        assert_eq!(stats.last_event(), None);
    }
}
