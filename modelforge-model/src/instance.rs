//! Descriptor-driven model instances.
//!
//! An [`Instance`] stores one slot per property of its descriptor, indexed
//! by declaration order. Public setters validate the value against the
//! property's category and raise before/after notifications around the
//! assignment; the factory and codec populate slots silently.

use std::fmt;
use std::sync::Arc;

use modelforge_schema::{PropertyCategory, PropertyDescriptor, SchemaDescriptor};
use modelforge_types::Value;

use crate::collection::ModelCollection;
use crate::notify::{ChangeNotifier, ChangePhase, ForwardLink, PropertyChange, SubscriptionId};
use crate::property::PropertyRef;
use crate::{ModelError, ModelFactory, ModelResult};

/// A live model conforming to a [`SchemaDescriptor`].
///
/// Instances are single-writer values: they are `Send + Sync`, but
/// concurrent mutation must be serialized by the caller. Cloning is deep and
/// yields an instance with no subscribers.
pub struct Instance {
    factory: ModelFactory,
    slots: Vec<Slot>,
    notifier: ChangeNotifier,
    serialized: Option<SerializedForm>,
}

/// Bytes this instance was decoded from, valid while the notifier revision
/// has not moved.
struct SerializedForm {
    revision: u64,
    bytes: Arc<[u8]>,
}

pub(crate) enum Slot {
    Scalar(Value),
    Model(ModelSlot),
    Array(ArraySlot),
    Collection(CollectionSlot),
}

#[derive(Default)]
pub(crate) struct ModelSlot {
    value: Option<Instance>,
    link: Option<ForwardLink>,
}

#[derive(Default)]
pub(crate) struct ArraySlot {
    items: Vec<Instance>,
    links: Vec<ForwardLink>,
}

pub(crate) struct CollectionSlot {
    collection: ModelCollection,
    // Lives as long as the collection; never detached.
    _link: ForwardLink,
}

impl ModelSlot {
    fn linked(value: Option<Instance>, parent: &ChangeNotifier, name: &str) -> Self {
        let link = value.as_ref().map(|child| child.notifier.forward_to(parent, name));
        Self { value, link }
    }

    fn replace(&mut self, value: Option<Instance>, parent: &ChangeNotifier, name: &str) -> Option<Instance> {
        if let (Some(old), Some(link)) = (&self.value, self.link.take()) {
            link.detach(&old.notifier);
        }
        self.link = value.as_ref().map(|child| child.notifier.forward_to(parent, name));
        std::mem::replace(&mut self.value, value)
    }
}

impl ArraySlot {
    fn linked(items: Vec<Instance>, parent: &ChangeNotifier, name: &str) -> Self {
        let links = items.iter().map(|item| item.notifier.forward_to(parent, name)).collect();
        Self { items, links }
    }

    fn replace(&mut self, items: Vec<Instance>, parent: &ChangeNotifier, name: &str) -> Vec<Instance> {
        for (item, link) in self.items.iter().zip(self.links.drain(..)) {
            link.detach(&item.notifier);
        }
        self.links = items.iter().map(|item| item.notifier.forward_to(parent, name)).collect();
        std::mem::replace(&mut self.items, items)
    }
}

impl CollectionSlot {
    fn new(collection: ModelCollection, parent: &ChangeNotifier, name: &str) -> Self {
        let link = collection.notifier().forward_to(parent, name);
        Self {
            collection,
            _link: link,
        }
    }
}

impl Slot {
    fn default_for(property: &PropertyDescriptor, parent: &ChangeNotifier) -> Self {
        match property.category() {
            PropertyCategory::Model(_) | PropertyCategory::Polymorphic(_) => Self::Model(ModelSlot::default()),
            PropertyCategory::ModelArray(_) => Self::Array(ArraySlot::default()),
            PropertyCategory::ModelCollection(contract) => Self::Collection(CollectionSlot::new(
                ModelCollection::new(property.name(), contract),
                parent,
                property.name(),
            )),
            scalar => Self::Scalar(scalar.default_value()),
        }
    }

    fn clone_linked(&self, parent: &ChangeNotifier, name: &str) -> Self {
        match self {
            Self::Scalar(v) => Self::Scalar(v.clone()),
            Self::Model(m) => Self::Model(ModelSlot::linked(m.value.clone(), parent, name)),
            Self::Array(a) => Self::Array(ArraySlot::linked(a.items.clone(), parent, name)),
            Self::Collection(c) => Self::Collection(CollectionSlot::new(c.collection.clone(), parent, name)),
        }
    }

    pub(crate) fn view(&self) -> PropertyRef<'_> {
        match self {
            Self::Scalar(v) => PropertyRef::Scalar(v),
            Self::Model(m) => PropertyRef::Model(m.value.as_ref()),
            Self::Array(a) => PropertyRef::Models(&a.items),
            Self::Collection(c) => PropertyRef::Models(c.collection.items()),
        }
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => a.value == b.value,
            (Self::Array(a), Self::Array(b)) => a.items == b.items,
            (Self::Collection(a), Self::Collection(b)) => a.collection == b.collection,
            _ => false,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v:?}"),
            Self::Model(m) => write!(f, "{:?}", m.value),
            Self::Array(a) => f.debug_list().entries(&a.items).finish(),
            Self::Collection(c) => write!(f, "{:?}", c.collection),
        }
    }
}

impl Instance {
    pub(crate) fn new(factory: ModelFactory) -> Self {
        let notifier = ChangeNotifier::new();
        let slots = factory
            .descriptor()
            .properties()
            .iter()
            .map(|p| Slot::default_for(p, &notifier))
            .collect();
        Self {
            factory,
            slots,
            notifier,
            serialized: None,
        }
    }

    /// The factory that produced this instance.
    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    /// The compiled contract.
    pub fn descriptor(&self) -> &Arc<SchemaDescriptor> {
        self.factory.descriptor()
    }

    /// Contract identity.
    pub fn contract(&self) -> &str {
        self.descriptor().identity()
    }

    /// Borrowed view of a readable property.
    pub fn property(&self, name: &str) -> ModelResult<PropertyRef<'_>> {
        let property = self.readable(name)?;
        Ok(self.slots[property.index()].view())
    }

    /// Reads a scalar property.
    pub fn get(&self, name: &str) -> ModelResult<&Value> {
        let property = self.readable(name)?;
        match &self.slots[property.index()] {
            Slot::Scalar(v) => Ok(v),
            _ => Err(self.mismatch(property, "scalar value")),
        }
    }

    /// Assigns a scalar property.
    ///
    /// The value must already have the property's type; `Null` is accepted
    /// only by nullable categories. Use the factory for coercing input.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let value = value.into();
        let descriptor = Arc::clone(self.descriptor());
        let property = writable(&descriptor, name)?;
        check_scalar(&descriptor, property, &value)?;
        self.assign_scalar(property, value);
        Ok(())
    }

    /// Reads a single nested model property.
    pub fn model(&self, name: &str) -> ModelResult<Option<&Instance>> {
        let property = self.readable(name)?;
        match &self.slots[property.index()] {
            Slot::Model(m) => Ok(m.value.as_ref()),
            _ => Err(self.mismatch(property, "model")),
        }
    }

    /// Mutable access to a nested model. Its changes are forwarded with the
    /// property name as prefix.
    pub fn model_mut(&mut self, name: &str) -> ModelResult<Option<&mut Instance>> {
        let descriptor = Arc::clone(self.descriptor());
        let property = readable(&descriptor, name)?;
        match &mut self.slots[property.index()] {
            Slot::Model(m) => Ok(m.value.as_mut()),
            _ => Err(mismatch(&descriptor, property, "model")),
        }
    }

    /// Assigns a single nested model, returning the previous one. The
    /// previous instance stops forwarding its events.
    pub fn set_model(&mut self, name: &str, value: Option<Instance>) -> ModelResult<Option<Instance>> {
        let descriptor = Arc::clone(self.descriptor());
        let property = writable(&descriptor, name)?;
        if let Some(child) = &value {
            check_model(property, child)?;
        }
        let Slot::Model(slot) = &mut self.slots[property.index()] else {
            return Err(mismatch(&descriptor, property, "model"));
        };
        self.notifier.raise(ChangePhase::Before, property.name());
        let old = slot.replace(value, &self.notifier, property.name());
        self.notifier.raise(ChangePhase::After, property.name());
        Ok(old)
    }

    /// Reads a model array or collection as a slice.
    pub fn models(&self, name: &str) -> ModelResult<&[Instance]> {
        let property = self.readable(name)?;
        match self.slots[property.index()].view() {
            PropertyRef::Models(items) => Ok(items),
            _ => Err(self.mismatch(property, "model sequence")),
        }
    }

    /// Mutable access to one element of a model array or collection.
    pub fn model_at_mut(&mut self, name: &str, index: usize) -> ModelResult<&mut Instance> {
        let descriptor = Arc::clone(self.descriptor());
        let property = readable(&descriptor, name)?;
        let items: &mut [Instance] = match &mut self.slots[property.index()] {
            Slot::Array(a) => &mut a.items,
            Slot::Collection(c) => {
                let len = c.collection.len();
                return c
                    .collection
                    .get_mut(index)
                    .ok_or(ModelError::IndexOutOfRange { index, len });
            }
            _ => return Err(mismatch(&descriptor, property, "model sequence")),
        };
        let len = items.len();
        items.get_mut(index).ok_or(ModelError::IndexOutOfRange { index, len })
    }

    /// Replaces the whole contents of a model array or collection, returning
    /// the previous elements. Raises one before/after pair for the property.
    pub fn set_models(&mut self, name: &str, items: Vec<Instance>) -> ModelResult<Vec<Instance>> {
        let descriptor = Arc::clone(self.descriptor());
        let property = writable(&descriptor, name)?;
        if !property.category().is_model_sequence() {
            return Err(mismatch(&descriptor, property, "model sequence"));
        }
        for item in &items {
            check_model(property, item)?;
        }
        self.notifier.raise(ChangePhase::Before, property.name());
        let old = match &mut self.slots[property.index()] {
            Slot::Array(a) => a.replace(items, &self.notifier, property.name()),
            Slot::Collection(c) => c.collection.replace_all_silently(items),
            _ => Vec::new(),
        };
        self.notifier.raise(ChangePhase::After, property.name());
        Ok(old)
    }

    /// Reads an observable collection property.
    pub fn collection(&self, name: &str) -> ModelResult<&ModelCollection> {
        let property = self.readable(name)?;
        match &self.slots[property.index()] {
            Slot::Collection(c) => Ok(&c.collection),
            _ => Err(self.mismatch(property, "model collection")),
        }
    }

    /// Mutable access to an observable collection property.
    pub fn collection_mut(&mut self, name: &str) -> ModelResult<&mut ModelCollection> {
        let descriptor = Arc::clone(self.descriptor());
        let property = readable(&descriptor, name)?;
        match &mut self.slots[property.index()] {
            Slot::Collection(c) => Ok(&mut c.collection),
            _ => Err(mismatch(&descriptor, property, "model collection")),
        }
    }

    /// Subscribes to before-change events at or beneath `path` (empty for
    /// every path).
    pub fn on_before_change<F>(&self, path: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&PropertyChange) + Send + Sync + 'static,
    {
        self.notifier.subscribe(ChangePhase::Before, path, Arc::new(handler))
    }

    /// Subscribes to after-change events at or beneath `path` (empty for
    /// every path).
    pub fn on_after_change<F>(&self, path: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&PropertyChange) + Send + Sync + 'static,
    {
        self.notifier.subscribe(ChangePhase::After, path, Arc::new(handler))
    }

    /// Removes a subscription made on this instance.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Number of live subscriptions on this instance, including the links
    /// that forward its events to a parent.
    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// Returns true while the instance still matches the bytes it was
    /// decoded from.
    pub fn has_serialized_form(&self) -> bool {
        self.serialized_bytes().is_some()
    }

    pub(crate) fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub(crate) fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub(crate) fn serialized_bytes(&self) -> Option<&Arc<[u8]>> {
        self.serialized
            .as_ref()
            .filter(|form| form.revision == self.notifier.revision())
            .map(|form| &form.bytes)
    }

    pub(crate) fn remember_serialized(&mut self, bytes: Arc<[u8]>) {
        self.serialized = Some(SerializedForm {
            revision: self.notifier.revision(),
            bytes,
        });
    }

    /// Restores every slot to its default without raising notifications.
    pub(crate) fn reset_slots(&mut self) {
        let descriptor = Arc::clone(self.descriptor());
        self.slots = descriptor
            .properties()
            .iter()
            .map(|p| Slot::default_for(p, &self.notifier))
            .collect();
        self.serialized = None;
    }

    /// Assigns a scalar with notifications, bypassing the writable check.
    pub(crate) fn assign_scalar(&mut self, property: &PropertyDescriptor, value: Value) {
        self.notifier.raise(ChangePhase::Before, property.name());
        self.slots[property.index()] = Slot::Scalar(value);
        self.notifier.raise(ChangePhase::After, property.name());
    }

    /// Populates a scalar slot silently. The value must already be valid.
    pub(crate) fn init_scalar(&mut self, property: &PropertyDescriptor, value: Value) {
        self.slots[property.index()] = Slot::Scalar(value);
    }

    /// Populates a single-model slot silently. The model must already be
    /// valid for the property.
    pub(crate) fn init_model(&mut self, property: &PropertyDescriptor, value: Option<Instance>) {
        if let Slot::Model(slot) = &mut self.slots[property.index()] {
            slot.replace(value, &self.notifier, property.name());
        }
    }

    /// Populates a sequence slot silently. Elements must already be valid
    /// for the property.
    pub(crate) fn init_models(&mut self, property: &PropertyDescriptor, items: Vec<Instance>) {
        match &mut self.slots[property.index()] {
            Slot::Array(a) => {
                a.replace(items, &self.notifier, property.name());
            }
            Slot::Collection(c) => {
                c.collection.replace_all_silently(items);
            }
            _ => {}
        }
    }

    fn readable(&self, name: &str) -> ModelResult<&PropertyDescriptor> {
        readable(self.descriptor(), name)
    }

    fn mismatch(&self, property: &PropertyDescriptor, expected: &str) -> ModelError {
        mismatch(self.descriptor(), property, expected)
    }
}

pub(crate) fn lookup<'d>(descriptor: &'d SchemaDescriptor, name: &str) -> ModelResult<&'d PropertyDescriptor> {
    descriptor.property(name).ok_or_else(|| ModelError::UnknownProperty {
        contract: descriptor.identity().to_string(),
        property: name.to_string(),
    })
}

fn readable<'d>(descriptor: &'d SchemaDescriptor, name: &str) -> ModelResult<&'d PropertyDescriptor> {
    let property = lookup(descriptor, name)?;
    if !property.readable() {
        return Err(ModelError::WriteOnly {
            contract: descriptor.identity().to_string(),
            property: name.to_string(),
        });
    }
    Ok(property)
}

fn writable<'d>(descriptor: &'d SchemaDescriptor, name: &str) -> ModelResult<&'d PropertyDescriptor> {
    let property = lookup(descriptor, name)?;
    if !property.writable() {
        return Err(ModelError::ReadOnly {
            contract: descriptor.identity().to_string(),
            property: name.to_string(),
        });
    }
    Ok(property)
}

fn mismatch(descriptor: &SchemaDescriptor, property: &PropertyDescriptor, actual: &str) -> ModelError {
    ModelError::TypeMismatch {
        contract: descriptor.identity().to_string(),
        property: property.name().to_string(),
        expected: property.category().to_string(),
        actual: actual.to_string(),
    }
}

/// Checks that `value` may be stored in a scalar property.
pub(crate) fn check_scalar(descriptor: &SchemaDescriptor, property: &PropertyDescriptor, value: &Value) -> ModelResult<()> {
    let category = property.category();
    let accepted = match category.value_type() {
        None => false,
        Some(_) if value.is_null() => category.is_nullable(),
        Some(ty) => ty.matches(value),
    };
    if accepted {
        Ok(())
    } else {
        Err(mismatch(descriptor, property, value.type_name()))
    }
}

/// Checks that `child` may be stored in a model property.
pub(crate) fn check_model(property: &PropertyDescriptor, child: &Instance) -> ModelResult<()> {
    let accepted = match property.category() {
        PropertyCategory::Model(c) | PropertyCategory::ModelArray(c) | PropertyCategory::ModelCollection(c) => {
            child.contract() == c
        }
        PropertyCategory::Polymorphic(base) => child.factory().is_assignable_to(base),
        _ => false,
    };
    if accepted {
        Ok(())
    } else {
        Err(ModelError::IncompatibleContract {
            property: property.name().to_string(),
            expected: property.category().to_string(),
            actual: child.contract().to_string(),
        })
    }
}

impl Clone for Instance {
    fn clone(&self) -> Self {
        let notifier = ChangeNotifier::new();
        let slots = self
            .descriptor()
            .properties()
            .iter()
            .zip(&self.slots)
            .map(|(p, slot)| slot.clone_linked(&notifier, p.name()))
            .collect();
        let serialized = self.serialized_bytes().map(|bytes| SerializedForm {
            revision: notifier.revision(),
            bytes: Arc::clone(bytes),
        });
        Self {
            factory: self.factory.clone(),
            slots,
            notifier,
            serialized,
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.contract() == other.contract() && self.slots == other.slots
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.contract());
        for (property, slot) in self.descriptor().properties().iter().zip(&self.slots) {
            s.field(property.name(), slot);
        }
        s.finish()
    }
}
