use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::combo::{self, KeyId, Modifier, ModifierSet};
use crate::errors::{self, HookError, KeyflowError, Result};

/// How long the delivery thread waits for an event before checking whether
/// it was asked to stop.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Receives keyboard events from a [`HookSource`].
///
/// Called on the hook's delivery thread, one event at a time.
pub trait KeyListener: Send + Sync {
    fn on_key_press(&self, modifiers: ModifierSet, key: &KeyId);

    fn on_key_release(&self, _modifiers: ModifierSet, _key: &KeyId) {}

    fn on_key_typed(&self, _text: &str) {}
}

/// A global keyboard event source.
///
/// After `unregister` returns, the listener passed to `register` must not be
/// called again.
pub trait HookSource: Send + Sync {
    /// # Errors
    ///
    /// Fails if the source cannot start delivering events.
    fn register(&self, listener: Arc<dyn KeyListener>) -> std::result::Result<(), HookError>;

    /// # Errors
    ///
    /// Fails if the source could not be torn down.
    fn unregister(&self) -> std::result::Result<(), HookError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Press { modifiers: ModifierSet, key: KeyId },
    Release { modifiers: ModifierSet, key: KeyId },
    Typed(String),
}

impl KeyEvent {
    pub fn press<K: Into<KeyId>>(modifiers: ModifierSet, key: K) -> Self {
        Self::Press {
            modifiers,
            key: key.into(),
        }
    }

    /// Reads an event from a line such as `press Ctrl+F12`, `release F12`,
    /// `type x` or a bare `Ctrl+F12` (a press).
    ///
    /// # Errors
    ///
    /// Fails when the line names no key or a non-modifier appears before the key.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb.to_ascii_lowercase(), rest),
            None => (String::new(), line),
        };
        match verb.as_str() {
            "press" => parse_keys(rest).map(|(modifiers, key)| Self::Press { modifiers, key }),
            "release" => parse_keys(rest).map(|(modifiers, key)| Self::Release { modifiers, key }),
            "type" => Ok(Self::Typed(rest.trim().to_owned())),
            _ => parse_keys(line).map(|(modifiers, key)| Self::Press { modifiers, key }),
        }
    }

    fn deliver(self, listener: &dyn KeyListener) {
        match self {
            Self::Press { modifiers, key } => listener.on_key_press(modifiers, &key),
            Self::Release { modifiers, key } => listener.on_key_release(modifiers, &key),
            Self::Typed(text) => listener.on_key_typed(&text),
        }
    }
}

/// The last token is the key as typed; everything before it must be a modifier.
fn parse_keys(raw: &str) -> Result<(ModifierSet, KeyId)> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mut tokens = combo::tokens(&compact);
    let key = tokens
        .pop()
        .ok_or_else(|| KeyflowError::InvalidEvent(raw.to_owned()))?;
    let modifiers = tokens
        .into_iter()
        .map(|token| {
            Modifier::from_token(token).ok_or_else(|| KeyflowError::InvalidEvent(raw.to_owned()))
        })
        .collect::<Result<ModifierSet>>()?;
    Ok((modifiers, KeyId::new(key)))
}

/// Pushes events into a [`ChannelHook`] from any thread.
#[derive(Debug, Clone)]
pub struct HookFeed {
    sender: mpsc::Sender<KeyEvent>,
}

impl HookFeed {
    /// Queues an event. Returns false once the hook has been dropped.
    pub fn send(&self, event: KeyEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn press<K: Into<KeyId>>(&self, modifiers: ModifierSet, key: K) -> bool {
        self.send(KeyEvent::press(modifiers, key))
    }
}

struct Delivery {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// An in-process [`HookSource`] fed through [`HookFeed`]s.
///
/// Registering starts a dedicated delivery thread that hands queued events to
/// the listener in order. Events queued while no listener is registered are
/// kept and delivered after the next registration.
pub struct ChannelHook {
    sender: mpsc::Sender<KeyEvent>,
    receiver: Arc<Mutex<mpsc::Receiver<KeyEvent>>>,
    delivery: Mutex<Option<Delivery>>,
}

impl Default for ChannelHook {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHook {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            delivery: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn feed(&self) -> HookFeed {
        HookFeed {
            sender: self.sender.clone(),
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.delivery.lock().is_some()
    }
}

impl HookSource for ChannelHook {
    fn register(&self, listener: Arc<dyn KeyListener>) -> std::result::Result<(), HookError> {
        let mut delivery = self.delivery.lock();
        if delivery.is_some() {
            return Err(HookError::Register("a listener is already registered".to_owned()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let receiver = Arc::clone(&self.receiver);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("keyflow-hook".to_owned())
            .spawn(move || deliver_loop(&receiver, &thread_stop, listener.as_ref()))
            .map_err(|err| HookError::Register(err.to_string()))?;

        *delivery = Some(Delivery { stop, handle });
        tracing::debug!("Channel hook registered");
        Ok(())
    }

    fn unregister(&self) -> std::result::Result<(), HookError> {
        let Some(Delivery { stop, handle }) = self.delivery.lock().take() else {
            return Ok(());
        };
        stop.store(true, Ordering::SeqCst);
        // A listener tearing down its own hook cannot wait for itself; the
        // stop flag ends the loop as soon as it returns.
        if handle.thread().id() == thread::current().id() {
            return Ok(());
        }
        handle
            .join()
            .map_err(|_| HookError::Unregister("delivery thread panicked".to_owned()))?;
        tracing::debug!("Channel hook unregistered");
        Ok(())
    }
}

impl Drop for ChannelHook {
    fn drop(&mut self) {
        errors::log!(self.unregister());
    }
}

fn deliver_loop(
    receiver: &Mutex<mpsc::Receiver<KeyEvent>>,
    stop: &AtomicBool,
    listener: &dyn KeyListener,
) {
    let receiver = receiver.lock();
    while !stop.load(Ordering::SeqCst) {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                event.deliver(listener);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KeyEvent;
    use crate::config::{KeyId, Modifier, ModifierSet};

    #[test]
    fn parse_press_lines() {
        let ctrl = ModifierSet::NONE.with(Modifier::Ctrl);
        assert_eq!(
            KeyEvent::parse("press Ctrl+F12").unwrap(),
            KeyEvent::press(ctrl, "F12")
        );
        assert_eq!(KeyEvent::parse(" ctrl + F12 ").unwrap(), KeyEvent::press(ctrl, "F12"));
        assert_eq!(
            KeyEvent::parse("press Shift").unwrap(),
            KeyEvent::press(ModifierSet::NONE, "Shift")
        );
    }

    #[test]
    fn parse_other_verbs() {
        assert_eq!(
            KeyEvent::parse("release F12").unwrap(),
            KeyEvent::Release {
                modifiers: ModifierSet::NONE,
                key: KeyId::new("F12"),
            }
        );
        assert_eq!(KeyEvent::parse("type x").unwrap(), KeyEvent::Typed("x".to_owned()));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(KeyEvent::parse("").is_err());
        assert!(KeyEvent::parse("press A+B").is_err());
    }
}
