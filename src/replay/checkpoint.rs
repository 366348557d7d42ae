use std::collections::BTreeMap;

use crate::registry::ObjectRegistry;

/// Registry snapshots taken every `interval` cursor positions so a seek can
/// resume from the nearest one instead of replaying from zero.
#[derive(Debug, Clone, Default)]
pub struct Checkpoints {
    interval: usize,
    saved: BTreeMap<usize, ObjectRegistry>,
}

impl Checkpoints {
    /// `interval == 0` disables snapshotting.
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            saved: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn clear(&mut self) {
        self.saved.clear();
    }

    /// Snapshot `registry` if `cursor` falls on the interval and none exists.
    pub fn record(&mut self, cursor: usize, registry: &ObjectRegistry) {
        if !self.is_enabled() || cursor == 0 || cursor % self.interval != 0 {
            return;
        }
        self.saved
            .entry(cursor)
            .or_insert_with(|| registry.clone());
    }

    /// Latest snapshot at or before `target`.
    pub fn nearest(&self, target: usize) -> Option<(usize, &ObjectRegistry)> {
        self.saved
            .range(..=target)
            .next_back()
            .map(|(cursor, registry)| (*cursor, registry))
    }
}
