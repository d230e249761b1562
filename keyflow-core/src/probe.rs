use std::collections::HashMap;
use std::env;
use std::path::Path;

use parking_lot::Mutex;

/// Remembers which external programs can be found on `PATH`.
///
/// Each program is looked up once; call [`ToolProbe::reset`] after the
/// environment changed (a tool was installed, `PATH` was edited).
#[derive(Debug, Default)]
pub struct ToolProbe {
    cache: Mutex<HashMap<String, bool>>,
}

impl ToolProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self, program: &str) -> bool {
        if let Some(&known) = self.cache.lock().get(program) {
            return known;
        }
        let found = search_path(program);
        if !found {
            tracing::warn!("`{}` was not found on PATH", program);
        }
        self.cache.lock().insert(program.to_owned(), found);
        found
    }

    pub fn reset(&self) {
        self.cache.lock().clear();
    }

    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

fn search_path(program: &str) -> bool {
    if program.contains('/') {
        return Path::new(program).is_file();
    }
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::ToolProbe;

    #[test]
    fn finds_shell() {
        let probe = ToolProbe::new();
        assert!(probe.is_available("sh"));
        assert!(probe.is_available("/bin/sh"));
    }

    #[test]
    fn caches_until_reset() {
        let probe = ToolProbe::new();
        assert!(!probe.is_available("keyflow-no-such-tool"));
        assert!(probe.is_available("sh"));
        assert_eq!(probe.cached(), 2);
        probe.reset();
        assert_eq!(probe.cached(), 0);
    }
}
