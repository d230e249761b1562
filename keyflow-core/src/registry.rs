use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{Action, Binding, KeyCombo};

type Table = HashMap<KeyCombo, Arc<dyn Action>>;

/// Combo to action table shared between the hook thread and the control side.
///
/// Reads take the lock only long enough to clone an `Arc`. Bulk replacement
/// builds the new table off-lock and swaps it in with one write, so a reader
/// sees either the old table or the new one.
#[derive(Debug, Default)]
pub struct Registry {
    table: RwLock<Table>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every binding, returning how many were installed.
    pub fn replace_all<I>(&self, bindings: I) -> usize
    where
        I: IntoIterator<Item = Binding>,
    {
        let mut table = Table::new();
        for binding in bindings {
            match binding.validate() {
                Ok((combo, action)) => {
                    if table.insert(combo.clone(), action).is_some() {
                        tracing::debug!("Binding for {} overrides an earlier one", combo);
                    }
                }
                Err(err) => tracing::warn!("Skipping invalid binding: {}", err),
            }
        }
        let installed = table.len();
        *self.table.write() = table;
        tracing::info!("Installed {} bindings", installed);
        installed
    }

    /// Inserts or overwrites a single binding. Returns false if it is invalid.
    pub fn add(&self, binding: Binding) -> bool {
        match binding.validate() {
            Ok((combo, action)) => {
                tracing::debug!("Binding {} to {}", combo, action.name());
                self.table.write().insert(combo, action);
                true
            }
            Err(err) => {
                tracing::warn!("Rejected binding: {}", err);
                false
            }
        }
    }

    /// Removes the binding for `combo`, returning whether one existed.
    pub fn remove(&self, combo: &str) -> bool {
        let combo = KeyCombo::normalize(combo);
        self.table.write().remove(&combo).is_some()
    }

    #[must_use]
    pub fn lookup(&self, combo: &KeyCombo) -> Option<Arc<dyn Action>> {
        self.table.read().get(combo).cloned()
    }

    /// Copy of all bindings, ordered by combo.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Binding> {
        let mut bindings: Vec<Binding> = self
            .table
            .read()
            .iter()
            .map(|(combo, action)| Binding::new(combo.clone(), Arc::clone(action)))
            .collect();
        bindings.sort_by(|a, b| a.combo.cmp(&b.combo));
        bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    pub fn clear(&self) {
        self.table.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Registry;
    use crate::config::{Action, Binding, KeyCombo};
    use crate::tests::test::Probe;

    fn action(name: &str) -> Arc<dyn Action> {
        Arc::new(Probe::new(name))
    }

    #[test]
    fn add_then_lookup_then_remove() {
        let registry = Registry::new();
        assert!(registry.add(Binding::new(" ctrl + f12 ", action("Volume Up"))));

        let found = registry.lookup(&KeyCombo::normalize("Ctrl+F12")).unwrap();
        assert_eq!(found.name(), "Volume Up");

        assert!(registry.remove("CTRL+F12"));
        assert!(registry.lookup(&KeyCombo::normalize("Ctrl+F12")).is_none());
        assert!(!registry.remove("Ctrl+F12"));
    }

    #[test]
    fn invalid_bindings_never_enter() {
        let registry = Registry::new();
        assert!(!registry.add(Binding::new("", action("x"))));
        assert!(!registry.add(Binding::new("Ctrl+Alt", action("x"))));
        assert!(!registry.add(Binding::unbound("Ctrl+K")));
        assert!(registry.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let registry = Registry::new();
        registry.add(Binding::new("Ctrl+K", action("first")));
        registry.add(Binding::new("k+ctrl", action("second")));
        assert_eq!(registry.len(), 1);
        let found = registry.lookup(&KeyCombo::normalize("Ctrl+K")).unwrap();
        assert_eq!(found.name(), "second");
    }

    #[test]
    fn replace_all_drops_invalid_and_keeps_valid() {
        let registry = Registry::new();
        registry.add(Binding::new("Ctrl+Old", action("old")));

        let installed = registry.replace_all(vec![
            Binding::new("Ctrl+A", action("a")),
            Binding::unbound("Ctrl+B"),
            Binding::new("", action("empty")),
            Binding::new("Alt+C", action("c")),
        ]);

        assert_eq!(installed, 2);
        assert!(registry.lookup(&KeyCombo::normalize("Ctrl+Old")).is_none());
        let combos: Vec<String> = registry
            .snapshot()
            .into_iter()
            .map(|b| b.combo.to_string())
            .collect();
        assert_eq!(combos, vec!["Alt+C".to_owned(), "Ctrl+A".to_owned()]);
    }

    #[test]
    fn snapshot_is_detached() {
        let registry = Registry::new();
        registry.add(Binding::new("Ctrl+A", action("a")));
        let snapshot = registry.snapshot();
        registry.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
