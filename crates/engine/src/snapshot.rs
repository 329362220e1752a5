//! Per-block snapshots of the mutable subsystem states.
//!
//! Capture is a value copy of the current state, not a walk over history.
//! The store keeps the most recent snapshots in a bounded ring.

use crate::bucket::BucketManager;
use crate::hostility::HostilityManager;
use crate::ledger::DualLedger;
use crate::pause::PauseManager;
use crate::samedir::SameDirectionManager;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Complete component states tagged with the block they follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub block_index: u32,
    pub bucket: BucketManager,
    pub pause: PauseManager,
    pub samedir: SameDirectionManager,
    pub hostility: HostilityManager,
    pub ledger: DualLedger,
}

/// Bounded ring of per-block snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStore {
    snapshots: VecDeque<EngineSnapshot>,
    cap: usize,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAP)
    }
}

impl SnapshotStore {
    pub const DEFAULT_CAP: usize = 100;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    /// Stores a snapshot, evicting the oldest past the cap.
    pub fn capture(&mut self, snapshot: EngineSnapshot) {
        if self.snapshots.len() == self.cap {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    #[must_use]
    pub fn latest(&self) -> Option<&EngineSnapshot> {
        self.snapshots.back()
    }

    #[must_use]
    pub fn at(&self, block_index: u32) -> Option<&EngineSnapshot> {
        self.snapshots.iter().find(|s| s.block_index == block_index)
    }

    /// Removes and returns the most recent snapshot (undo path).
    pub fn pop_last(&mut self) -> Option<EngineSnapshot> {
        self.snapshots.pop_back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
