use std::collections::HashMap;
use std::process::Child;

/// Processes spawned by actions that have not been waited on yet.
///
/// Nothing blocks on a child: `reap` only collects the ones that already
/// exited, so it is safe to call from the hook thread.
#[derive(Debug, Default)]
pub struct Children {
    inner: HashMap<u32, Child>,
}

impl Children {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    /// Insert a `Child` in the `Children`.
    /// If this `Children` did not have this value present, true is returned.
    pub fn insert(&mut self, child: Child) -> bool {
        self.inner.insert(child.id(), child).is_none()
    }
    /// Drops every child that has exited, returning how many were reaped.
    pub fn reap(&mut self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|pid, child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                if !status.success() {
                    tracing::debug!("Child {} exited with {}", pid, status);
                }
                false
            }
            Err(err) => {
                tracing::warn!("Could not poll child {}: {}", pid, err);
                false
            }
        });
        before - self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use std::process::{Command, Stdio};
    use std::time::{Duration, Instant};

    use super::Children;

    #[test]
    fn reap_collects_exited_children() {
        let mut children = Children::new();
        let child = Command::new("true").stdout(Stdio::null()).spawn().unwrap();
        assert!(children.insert(child));
        assert_eq!(children.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !children.is_empty() && Instant::now() < deadline {
            children.reap();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(children.is_empty());
    }
}
