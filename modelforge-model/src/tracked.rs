//! Change tracking over an original/current pair.

use std::ops::{Deref, DerefMut};

use modelforge_types::TrackingId;

use crate::{AuditedChange, Instance, ModelError, ModelResult};

/// Wraps a snapshot of an instance as loaded together with a working copy.
///
/// Reads and writes go to the current copy (directly, or through `Deref`).
/// Both copies are deep clones, so neither aliases the instance the proxy
/// was built from.
#[derive(Debug)]
pub struct TrackedModel {
    tracking_id: TrackingId,
    original: Instance,
    current: Instance,
}

impl TrackedModel {
    /// Starts tracking from `original`.
    pub fn new(original: &Instance) -> Self {
        Self {
            tracking_id: TrackingId::new(),
            original: original.clone(),
            current: original.clone(),
        }
    }

    /// Starts tracking with an explicit working copy.
    pub fn from_pair(original: &Instance, current: &Instance) -> ModelResult<Self> {
        if original.contract() != current.contract() {
            return Err(ModelError::IncompatibleContract {
                property: "current".to_string(),
                expected: original.contract().to_string(),
                actual: current.contract().to_string(),
            });
        }
        Ok(Self {
            tracking_id: TrackingId::new(),
            original: original.clone(),
            current: current.clone(),
        })
    }

    /// Process-unique identity assigned at construction.
    pub fn tracking_id(&self) -> TrackingId {
        self.tracking_id
    }

    pub fn original(&self) -> &Instance {
        &self.original
    }

    pub fn current(&self) -> &Instance {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Instance {
        &mut self.current
    }

    /// Compares the current copy against `other`.
    pub fn compare(&self, other: Option<&Instance>, prefix: &str) -> Vec<AuditedChange> {
        self.current.compare(other, prefix)
    }

    /// Changes made since tracking started or since the last commit.
    pub fn changes(&self) -> Vec<AuditedChange> {
        self.current.compare(Some(&self.original), "")
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    /// Accepts the current state as the new original.
    pub fn commit(&mut self) {
        self.original = self.current.clone();
    }

    /// Discards changes. The working copy is replaced, so subscriptions
    /// made on it are dropped.
    pub fn revert(&mut self) {
        self.current = self.original.clone();
    }

    pub fn into_current(self) -> Instance {
        self.current
    }
}

impl Deref for TrackedModel {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.current
    }
}

impl DerefMut for TrackedModel {
    fn deref_mut(&mut self) -> &mut Instance {
        &mut self.current
    }
}
