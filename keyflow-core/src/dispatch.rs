use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::{Action, KeyCombo, KeyId, ModifierSet, Settings};
use crate::debounce::Debouncer;
use crate::errors::ActionError;
use crate::hook::KeyListener;
use crate::registry::Registry;
use crate::stats::Statistics;

/// Called with the action's display name after every successful trigger.
pub type Observer = Arc<dyn Fn(&str) + Send + Sync>;

/// What happened to a single key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Disabled,
    Modifier,
    Debounced(KeyCombo),
    Unbound(KeyCombo),
    Failed(KeyCombo),
    Triggered(KeyCombo),
}

/// The per-event pipeline run on the hook thread.
pub struct Dispatcher {
    enabled: Arc<AtomicBool>,
    registry: Arc<Registry>,
    debouncer: Debouncer,
    stats: Statistics,
    observer: RwLock<Option<Observer>>,
}

impl Dispatcher {
    pub fn new(enabled: Arc<AtomicBool>, registry: Arc<Registry>, settings: Settings) -> Self {
        Self {
            enabled,
            registry,
            debouncer: Debouncer::new(settings.debounce),
            stats: Statistics::new(settings.statistics),
            observer: RwLock::new(None),
        }
    }

    pub fn set_observer<F>(&self, observer: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.observer.write() = Some(Arc::new(observer));
    }

    pub fn clear_observer(&self) {
        *self.observer.write() = None;
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    #[must_use]
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Runs one key press through the pipeline.
    ///
    /// Never panics: a panic anywhere in the pipeline is logged and reported
    /// as [`Outcome::Failed`].
    pub fn dispatch(&self, modifiers: ModifierSet, key: &KeyId) -> Outcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process(modifiers, key))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                tracing::error!(
                    "Unexpected failure while handling {}: {}",
                    key.as_str(),
                    panic_message(payload.as_ref())
                );
                Outcome::Failed(KeyCombo::from_parts(modifiers, key))
            }
        }
    }

    fn process(&self, modifiers: ModifierSet, key: &KeyId) -> Outcome {
        if !self.enabled.load(Ordering::Acquire) {
            return Outcome::Disabled;
        }
        if key.is_modifier() {
            return Outcome::Modifier;
        }
        self.stats.record_event();

        let combo = KeyCombo::from_parts(modifiers, key);
        if self.debouncer.should_suppress(&combo, Instant::now()) {
            tracing::trace!("Debounced {}", combo);
            return Outcome::Debounced(combo);
        }

        // `lookup` releases the registry lock before returning.
        let Some(action) = self.registry.lookup(&combo) else {
            return Outcome::Unbound(combo);
        };

        if let Err(err) = invoke(action.as_ref()) {
            tracing::error!("Action {} bound to {} failed: {}", action.name(), combo, err);
            return Outcome::Failed(combo);
        }

        tracing::debug!("{} triggered {} ({})", combo, action.name(), action.category());
        self.stats.record_trigger();
        self.notify(action.name());
        Outcome::Triggered(combo)
    }

    fn notify(&self, name: &str) {
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| observer(name))) {
                tracing::error!("Trigger observer panicked: {}", panic_message(payload.as_ref()));
            }
        }
    }
}

impl KeyListener for Dispatcher {
    fn on_key_press(&self, modifiers: ModifierSet, key: &KeyId) {
        self.dispatch(modifiers, key);
    }

    fn on_key_release(&self, _modifiers: ModifierSet, key: &KeyId) {
        tracing::trace!("Release of {} ignored", key.as_str());
    }
}

fn invoke(action: &dyn Action) -> Result<(), ActionError> {
    panic::catch_unwind(AssertUnwindSafe(|| action.execute()))
        .unwrap_or_else(|payload| Err(ActionError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
