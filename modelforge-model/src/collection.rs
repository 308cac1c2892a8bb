//! Observable collections of models.
//!
//! A [`ModelCollection`] raises one structured after-change notification per
//! operation, followed by a plain notification with an empty relative path.
//! Once forwarded through the owning instance these read
//! `"Lines.Remove(-1,0,0,1)"` and `"Lines"`. A plain before-change
//! notification (`"Lines"`) precedes every mutation. Indices follow the
//! `(newIndex,newCount,oldIndex,oldCount)` convention, with `-1` for a side
//! the operation does not touch.

use std::fmt;
use std::str::FromStr;

use crate::notify::{ChangeNotifier, ForwardLink};
use crate::{Instance, ModelError, ModelResult};

/// The kind of collection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionOp {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

impl CollectionOp {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Remove => "Remove",
            Self::Replace => "Replace",
            Self::Move => "Move",
            Self::Reset => "Reset",
        }
    }
}

impl FromStr for CollectionOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Add" => Self::Add,
            "Remove" => Self::Remove,
            "Replace" => Self::Replace,
            "Move" => Self::Move,
            "Reset" => Self::Reset,
            _ => return Err(()),
        })
    }
}

/// Describes one collection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionChange {
    pub op: CollectionOp,
    pub new_index: i64,
    pub new_count: usize,
    pub old_index: i64,
    pub old_count: usize,
}

impl CollectionChange {
    fn added(index: usize) -> Self {
        Self {
            op: CollectionOp::Add,
            new_index: index as i64,
            new_count: 1,
            old_index: -1,
            old_count: 0,
        }
    }

    fn removed(index: usize) -> Self {
        Self {
            op: CollectionOp::Remove,
            new_index: -1,
            new_count: 0,
            old_index: index as i64,
            old_count: 1,
        }
    }

    fn replaced(index: usize) -> Self {
        Self {
            op: CollectionOp::Replace,
            new_index: index as i64,
            new_count: 1,
            old_index: index as i64,
            old_count: 1,
        }
    }

    fn moved(from: usize, to: usize) -> Self {
        Self {
            op: CollectionOp::Move,
            new_index: to as i64,
            new_count: 1,
            old_index: from as i64,
            old_count: 1,
        }
    }

    fn reset() -> Self {
        Self {
            op: CollectionOp::Reset,
            new_index: -1,
            new_count: 0,
            old_index: -1,
            old_count: 0,
        }
    }

    /// Splits a notification path such as `"Order.Lines.Add(2,1,-1,0)"` into
    /// the collection's property path and the change it describes.
    pub fn parse(path: &str) -> Option<(&str, Self)> {
        let body = path.strip_suffix(')')?;
        let (head, args) = body.rsplit_once('(')?;
        let (property, op) = match head.rsplit_once('.') {
            Some((property, op)) => (property, op),
            None => ("", head),
        };
        let op = op.parse().ok()?;
        let mut parts = args.split(',').map(str::trim);
        let change = Self {
            op,
            new_index: parts.next()?.parse().ok()?,
            new_count: parts.next()?.parse().ok()?,
            old_index: parts.next()?.parse().ok()?,
            old_count: parts.next()?.parse().ok()?,
        };
        if parts.next().is_some() {
            return None;
        }
        Some((property, change))
    }
}

impl fmt::Display for CollectionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{},{},{})",
            self.op.name(),
            self.new_index,
            self.new_count,
            self.old_index,
            self.old_count
        )
    }
}

/// An observable, index-addressed sequence of models of one contract.
///
/// Element events are forwarded with no extra prefix, so a change to
/// `City` on any element surfaces as `"Lines.City"` on the owning instance.
pub struct ModelCollection {
    property: String,
    contract: String,
    items: Vec<Instance>,
    links: Vec<ForwardLink>,
    notifier: ChangeNotifier,
}

impl ModelCollection {
    pub(crate) fn new(property: &str, contract: &str) -> Self {
        Self {
            property: property.to_string(),
            contract: contract.to_string(),
            items: Vec::new(),
            links: Vec::new(),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Contract identity every element must have.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.items.get(index)
    }

    /// Mutable access to one element. Its changes are forwarded.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Instance> {
        self.items.get_mut(index)
    }

    pub fn items(&self) -> &[Instance] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.items.iter()
    }

    /// Appends an element.
    pub fn push(&mut self, item: Instance) -> ModelResult<()> {
        self.insert(self.items.len(), item)
    }

    /// Inserts an element at `index`, shifting later elements up.
    pub fn insert(&mut self, index: usize, item: Instance) -> ModelResult<()> {
        self.check(&item)?;
        if index > self.items.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.announce();
        let link = item.notifier().forward_to(&self.notifier, "");
        self.items.insert(index, item);
        self.links.insert(index, link);
        self.notify(CollectionChange::added(index));
        Ok(())
    }

    /// Removes and returns the element at `index`. The returned instance no
    /// longer forwards its events.
    pub fn remove(&mut self, index: usize) -> ModelResult<Instance> {
        self.check_index(index)?;
        self.announce();
        let item = self.items.remove(index);
        self.links.remove(index).detach(item.notifier());
        self.notify(CollectionChange::removed(index));
        Ok(item)
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, item: Instance) -> ModelResult<Instance> {
        self.check(&item)?;
        self.check_index(index)?;
        self.announce();
        let link = item.notifier().forward_to(&self.notifier, "");
        let old = std::mem::replace(&mut self.items[index], item);
        std::mem::replace(&mut self.links[index], link).detach(old.notifier());
        self.notify(CollectionChange::replaced(index));
        Ok(old)
    }

    /// Moves the element at `from` so that it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> ModelResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        self.announce();
        let item = self.items.remove(from);
        let link = self.links.remove(from);
        self.items.insert(to, item);
        self.links.insert(to, link);
        self.notify(CollectionChange::moved(from, to));
        Ok(())
    }

    /// Exchanges the elements at `a` and `b`, raising a `Move` notification
    /// from `a` to `b`.
    pub fn swap(&mut self, a: usize, b: usize) -> ModelResult<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        self.announce();
        self.items.swap(a, b);
        self.links.swap(a, b);
        self.notify(CollectionChange::moved(a, b));
        Ok(())
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.announce();
        self.detach_all();
        self.items.clear();
        self.notify(CollectionChange::reset());
    }

    pub(crate) fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Replaces the contents without raising notifications. Elements must
    /// already have been checked against the contract.
    pub(crate) fn replace_all_silently(&mut self, items: Vec<Instance>) -> Vec<Instance> {
        self.detach_all();
        self.links = items
            .iter()
            .map(|item| item.notifier().forward_to(&self.notifier, ""))
            .collect();
        std::mem::replace(&mut self.items, items)
    }

    fn detach_all(&mut self) {
        for (item, link) in self.items.iter().zip(self.links.drain(..)) {
            link.detach(item.notifier());
        }
    }

    /// Raises the before-change event for the collection property itself.
    fn announce(&self) {
        self.notifier.raise(crate::ChangePhase::Before, "");
    }

    fn notify(&self, change: CollectionChange) {
        self.notifier.raise(crate::ChangePhase::After, &change.to_string());
        self.notifier.raise(crate::ChangePhase::After, "");
    }

    fn check(&self, item: &Instance) -> ModelResult<()> {
        if item.contract() == self.contract {
            Ok(())
        } else {
            Err(ModelError::IncompatibleContract {
                property: self.property.clone(),
                expected: self.contract.clone(),
                actual: item.contract().to_string(),
            })
        }
    }

    fn check_index(&self, index: usize) -> ModelResult<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ModelError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}

impl Clone for ModelCollection {
    fn clone(&self) -> Self {
        let mut copy = Self::new(&self.property, &self.contract);
        copy.replace_all_silently(self.items.clone());
        copy
    }
}

impl PartialEq for ModelCollection {
    fn eq(&self, other: &Self) -> bool {
        self.contract == other.contract && self.items == other.items
    }
}

impl fmt::Debug for ModelCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<'a> IntoIterator for &'a ModelCollection {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_paths_format_and_parse() {
        let change = CollectionChange::removed(0);
        assert_eq!(change.to_string(), "Remove(-1,0,0,1)");
        let (property, parsed) = CollectionChange::parse("Order.Lines.Remove(-1,0,0,1)").unwrap();
        assert_eq!(property, "Order.Lines");
        assert_eq!(parsed, change);
    }

    #[test]
    fn parse_rejects_plain_paths() {
        assert!(CollectionChange::parse("Lines").is_none());
        assert!(CollectionChange::parse("Lines.Frobnicate(1,1,1,1)").is_none());
        assert!(CollectionChange::parse("Lines.Add(1,1,1)").is_none());
    }
}
