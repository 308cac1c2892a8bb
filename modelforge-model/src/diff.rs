//! Structural differencer.
//!
//! [`Instance::compare`] walks the properties of `self` in declaration order
//! and reports how `self` differs from `other`, where an absent `other`
//! stands for an all-default instance. Records are ordered by property, then
//! by element index, with nested records following their parent's record.

use std::fmt;

use crate::instance::Slot;
use crate::property::{PropertyRef, PropertyValue};
use crate::Instance;

/// Direction of an audited change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Present in `other`, absent in the current instance.
    Removed,
    /// Present in the current instance and new or different from `other`.
    NewOrModified,
}

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditedChange {
    /// Dotted property path, e.g. `"Address.City"`.
    pub path: String,
    pub kind: ChangeKind,
    /// Element index for sequence properties, 0 otherwise.
    pub index: usize,
    /// The current value. Removed records carry null.
    pub value: PropertyValue,
}

impl AuditedChange {
    fn new(path: String, kind: ChangeKind, index: usize, value: PropertyValue) -> Self {
        Self {
            path,
            kind,
            index,
            value,
        }
    }
}

impl fmt::Display for AuditedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChangeKind::Removed => "removed",
            ChangeKind::NewOrModified => "new-or-modified",
        };
        write!(f, "{}[{}] {}", self.path, self.index, kind)
    }
}

impl Instance {
    /// Compares this instance against `other` (or against defaults when
    /// `other` is `None`). `prefix` is prepended verbatim to every path;
    /// nested models recurse with `"<prefix><Name>."`.
    ///
    /// Write-only properties are not compared.
    ///
    /// # Panics
    ///
    /// Panics if `other` is an instance of a different contract.
    pub fn compare(&self, other: Option<&Instance>, prefix: &str) -> Vec<AuditedChange> {
        if let Some(other) = other {
            assert!(
                self.contract() == other.contract(),
                "cannot compare an instance of {} with an instance of {}",
                self.contract(),
                other.contract()
            );
        }
        let mut changes = Vec::new();
        self.compare_into(other, prefix, &mut changes);
        changes
    }

    fn compare_into(&self, other: Option<&Instance>, prefix: &str, out: &mut Vec<AuditedChange>) {
        for property in self.descriptor().properties() {
            if !property.readable() {
                continue;
            }
            let path = format!("{prefix}{}", property.name());
            let theirs = other.map(|o| o.slot(property.index()));
            match self.slot(property.index()).view() {
                PropertyRef::Scalar(mine) => {
                    let default = property.category().default_value();
                    let theirs = match theirs.map(Slot::view) {
                        Some(PropertyRef::Scalar(v)) => v,
                        _ => &default,
                    };
                    if mine != theirs {
                        out.push(AuditedChange::new(
                            path,
                            ChangeKind::NewOrModified,
                            0,
                            PropertyValue::Scalar(mine.clone()),
                        ));
                    }
                }
                PropertyRef::Model(mine) => {
                    let theirs = match theirs.map(Slot::view) {
                        Some(PropertyRef::Model(m)) => m,
                        _ => None,
                    };
                    compare_models(path, mine, theirs, out);
                }
                PropertyRef::Models(mine) => {
                    let theirs: &[Instance] = match theirs.map(Slot::view) {
                        Some(PropertyRef::Models(items)) => items,
                        _ => &[],
                    };
                    compare_sequences(&path, mine, theirs, out);
                }
            }
        }
    }
}

fn compare_models(path: String, mine: Option<&Instance>, theirs: Option<&Instance>, out: &mut Vec<AuditedChange>) {
    match (mine, theirs) {
        (None, None) => {}
        (None, Some(_)) => out.push(AuditedChange::new(path, ChangeKind::Removed, 0, PropertyValue::Model(None))),
        (Some(mine), Some(theirs)) if mine.contract() == theirs.contract() => {
            let prefix = format!("{path}.");
            mine.compare_into(Some(theirs), &prefix, out);
        }
        // Newly present, or replaced by a different concrete contract.
        (Some(mine), _) => {
            let prefix = format!("{path}.");
            out.push(AuditedChange::new(
                path,
                ChangeKind::NewOrModified,
                0,
                PropertyValue::Model(Some(mine.clone())),
            ));
            mine.compare_into(None, &prefix, out);
        }
    }
}

fn compare_sequences(path: &str, mine: &[Instance], theirs: &[Instance], out: &mut Vec<AuditedChange>) {
    for index in 0..mine.len().max(theirs.len()) {
        match (mine.get(index), theirs.get(index)) {
            (Some(m), Some(t)) if m == t => {}
            (Some(m), _) => out.push(AuditedChange::new(
                path.to_string(),
                ChangeKind::NewOrModified,
                index,
                PropertyValue::Model(Some(m.clone())),
            )),
            (None, Some(_)) => out.push(AuditedChange::new(
                path.to_string(),
                ChangeKind::Removed,
                index,
                PropertyValue::Model(None),
            )),
            (None, None) => {}
        }
    }
}
