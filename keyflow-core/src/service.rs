use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{Binding, Config, Settings, Shortcut, Store};
use crate::dispatch::Dispatcher;
use crate::errors::{self, HookError, Result};
use crate::hook::{HookSource, KeyListener};
use crate::launcher::Launcher;
use crate::registry::Registry;
use crate::stats::StatsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    Unregistered,
    RegisteredDisabled,
    RegisteredEnabled,
}

impl Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::RegisteredDisabled => "disabled",
            Self::RegisteredEnabled => "enabled",
        };
        f.write_str(name)
    }
}

/// Owns the hook registration and everything the hook thread dispatches into.
///
/// Whether the hook is registered (`hooked`) and whether events are acted on
/// (`enabled`) are separate: `stop` keeps the registration so `resume` is
/// cheap, `unregister` gives it back.
pub struct HotkeyService {
    hook: Arc<dyn HookSource>,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    launcher: Arc<Launcher>,
    enabled: Arc<AtomicBool>,
    hooked: AtomicBool,
    transition: Mutex<()>,
}

impl HotkeyService {
    pub fn new(hook: Arc<dyn HookSource>, settings: Settings) -> Self {
        let enabled = Arc::new(AtomicBool::new(false));
        let registry = Arc::new(Registry::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&enabled),
            Arc::clone(&registry),
            settings,
        ));
        Self {
            hook,
            registry,
            dispatcher,
            launcher: Arc::new(Launcher::new()),
            enabled,
            hooked: AtomicBool::new(false),
            transition: Mutex::new(()),
        }
    }

    /// Builds a service with the settings and shortcuts of `config`.
    pub fn with_config(hook: Arc<dyn HookSource>, config: &dyn Config) -> Self {
        let service = Self::new(hook, config.settings());
        service.install(&config.shortcuts());
        service
    }

    /// Registers the hook if needed and enables dispatching.
    ///
    /// # Errors
    ///
    /// Fails if the hook source refuses the registration, or another thread
    /// is registering at the same time. The service stays unregistered.
    pub fn start(&self) -> std::result::Result<(), HookError> {
        let Some(_transition) = self.transition.try_lock() else {
            tracing::warn!("Hook registration already in progress");
            return Err(HookError::RegistrationInProgress);
        };
        if self.hooked.load(Ordering::Acquire) {
            self.enabled.store(true, Ordering::Release);
            tracing::info!("Hotkey service enabled");
            return Ok(());
        }

        let listener: Arc<dyn KeyListener> = self.dispatcher.clone();
        if let Err(err) = self.hook.register(listener) {
            tracing::error!("{}", err);
            return Err(err);
        }
        self.hooked.store(true, Ordering::Release);
        self.enabled.store(true, Ordering::Release);
        tracing::info!(
            "Hotkey service started with {} bindings, debounce {:?}",
            self.registry.len(),
            self.dispatcher.debouncer().threshold()
        );
        Ok(())
    }

    /// Stops acting on events while keeping the hook registered.
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::Release);
        tracing::info!("Hotkey service disabled");
    }

    /// Re-enables a stopped service. Returns false if it was never started.
    pub fn resume(&self) -> bool {
        if !self.hooked.load(Ordering::Acquire) {
            tracing::warn!("Cannot resume hotkey service: hook is not registered");
            return false;
        }
        self.enabled.store(true, Ordering::Release);
        tracing::info!("Hotkey service resumed");
        true
    }

    /// Disables the service and releases the hook. Does nothing when not hooked.
    ///
    /// # Errors
    ///
    /// Fails if the hook source could not be torn down; the service is then
    /// left registered but disabled.
    pub fn unregister(&self) -> std::result::Result<(), HookError> {
        {
            let _transition = self.transition.lock();
            self.enabled.store(false, Ordering::Release);
            if !self.hooked.swap(false, Ordering::AcqRel) {
                return Ok(());
            }
        }
        // Released outside `transition`: tearing the hook down may wait for a
        // delivery thread that is itself calling into the service.
        if let Err(err) = self.hook.unregister() {
            tracing::error!("{}", err);
            self.hooked.store(true, Ordering::Release);
            return Err(err);
        }
        tracing::info!("Hotkey service unregistered");
        Ok(())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_hooked(&self) -> bool {
        self.hooked.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        match (self.is_hooked(), self.is_active()) {
            (false, _) => ServiceState::Unregistered,
            (true, false) => ServiceState::RegisteredDisabled,
            (true, true) => ServiceState::RegisteredEnabled,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn launcher(&self) -> &Arc<Launcher> {
        &self.launcher
    }

    /// Turns persisted shortcuts into bindings and swaps them in.
    pub fn install(&self, shortcuts: &[Shortcut]) -> usize {
        let bindings: Vec<Binding> = shortcuts
            .iter()
            .map(|shortcut| shortcut.to_binding(&self.launcher))
            .collect();
        self.registry.replace_all(bindings)
    }

    /// Replaces the registry with the contents of `store`.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read; the registry is left untouched.
    pub fn load(&self, store: &dyn Store) -> Result<usize> {
        let shortcuts = store.load()?;
        Ok(self.install(&shortcuts))
    }

    #[must_use]
    pub fn statistics(&self) -> StatsSnapshot {
        let stats = self.dispatcher.statistics();
        StatsSnapshot {
            enabled: self.is_active(),
            hooked: self.is_hooked(),
            registered_count: self.registry.len(),
            events_processed: stats.events_processed(),
            shortcuts_triggered: stats.shortcuts_triggered(),
            last_event_timestamp: stats.last_event(),
        }
    }

    pub fn reset_statistics(&self) {
        self.dispatcher.statistics().reset();
        self.dispatcher.debouncer().clear();
    }
}

impl Drop for HotkeyService {
    fn drop(&mut self) {
        if self.is_hooked() {
            errors::log!(self.unregister());
        }
    }
}
