//! Log-once bookkeeping for per-frame diagnostics.

use std::collections::HashSet;
use std::fmt::Display;

/// Remembers which diagnostics an owner has already reported so that a
/// condition persisting across frames is logged a single time.
#[derive(Debug, Default, Clone)]
pub struct LogOnce {
    reported: HashSet<&'static str>,
}

impl LogOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `message` at warn level unless `key` was already reported.
    /// Returns true if the message was emitted.
    pub fn warn(&mut self, key: &'static str, message: impl Display) -> bool {
        let first = self.reported.insert(key);
        if first {
            log::warn!("{message}");
        }
        first
    }

    /// Logs `message` at error level unless `key` was already reported.
    pub fn error(&mut self, key: &'static str, message: impl Display) -> bool {
        let first = self.reported.insert(key);
        if first {
            log::error!("{message}");
        }
        first
    }

    pub fn was_reported(&self, key: &str) -> bool {
        self.reported.contains(key)
    }

    /// Number of distinct keys reported so far.
    pub fn count(&self) -> usize {
        self.reported.len()
    }

    /// Forgets `key` so the next occurrence is logged again.
    pub fn reset(&mut self, key: &str) {
        self.reported.remove(key);
    }

    pub fn clear(&mut self) {
        self.reported.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_once_per_key() {
        let mut once = LogOnce::new();
        assert!(once.warn("camera", "no camera"));
        assert!(!once.warn("camera", "no camera"));
        assert!(once.error("scene", "scene mismatch"));
        assert_eq!(once.count(), 2);

        once.reset("camera");
        assert!(!once.was_reported("camera"));
        assert!(once.warn("camera", "no camera"));
    }
}
