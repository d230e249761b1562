use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{DEFAULT_DEBOUNCE, KeyCombo};

/// Drops repeated triggers of one combo that arrive within `threshold`.
///
/// A suppressed press does not move the window forward, so holding a key
/// down produces one trigger per `threshold` at most.
#[derive(Debug)]
pub struct Debouncer {
    threshold: Duration,
    last_trigger: Mutex<HashMap<KeyCombo, Instant>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_trigger: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn should_suppress(&self, combo: &KeyCombo, now: Instant) -> bool {
        let mut last_trigger = self.last_trigger.lock();
        if let Some(&last) = last_trigger.get(combo) {
            if now.saturating_duration_since(last) < self.threshold {
                return true;
            }
        }
        last_trigger.insert(combo.clone(), now);
        false
    }

    pub fn clear(&self) {
        self.last_trigger.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.last_trigger.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_trigger.lock().is_empty()
    }
}
