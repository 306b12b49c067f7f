use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::CalendarEvent;

/// Content hash of an event snapshot.
///
/// Two snapshots with equal events in equal order hash equally; reordering
/// counts as a change because it changes stacking order.
#[must_use]
pub fn fingerprint(events: &[CalendarEvent]) -> u64 {
    let mut hasher = DefaultHasher::new();
    events.len().hash(&mut hasher);

    for event in events {
        // Serializing into a `Vec` cannot fail for these field types.
        serde_json::to_vec(event)
            .unwrap_or_default()
            .hash(&mut hasher);
    }

    hasher.finish()
}

/// Remembers the last observed fingerprint so redundant updates can be dropped.
#[derive(Debug, Default, Clone)]
pub struct ChangeDetector {
    last: Option<u64>,
    version: u64,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and bumps the version when `fingerprint` differs from the
    /// previously observed one.
    pub fn observe(&mut self, fingerprint: u64) -> bool {
        if self.last == Some(fingerprint) {
            return false;
        }

        self.last = Some(fingerprint);
        self.version += 1;
        true
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.last
    }
}
