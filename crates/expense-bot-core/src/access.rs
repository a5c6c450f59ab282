//! Sender allow-list check.
//!
//! Every inbound event passes through [`AccessGuard`] before any handler runs.
//! A denied event is dropped without a reply.

use std::collections::HashSet;

/// Fixed allow-list of sender identities, compared by exact match.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    allowed: HashSet<i64>,
}

impl AccessGuard {
    /// Create a guard for the given identities.
    #[must_use]
    pub const fn new(allowed: HashSet<i64>) -> Self {
        Self { allowed }
    }

    /// Returns `true` if `sender_id` may use the bot.
    #[must_use]
    pub fn allows(&self, sender_id: i64) -> bool {
        self.allowed.contains(&sender_id)
    }

    /// Number of configured identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Returns `true` if nobody is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl FromIterator<i64> for AccessGuard {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let guard: AccessGuard = [945_852_428].into_iter().collect();
        assert!(guard.allows(945_852_428));
        assert!(!guard.allows(945_852_429));
        assert!(!guard.allows(0));
    }

    #[test]
    fn test_empty_guard_denies_everyone() {
        let guard = AccessGuard::default();
        assert!(guard.is_empty());
        assert!(!guard.allows(1));
    }
}
