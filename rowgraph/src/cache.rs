//! Scope-lived store of constructed instances, keyed by identity.

use core::any::{Any, TypeId};
use std::collections::HashMap;

use rowgraph_core::{Mappable, Shape};

use crate::{Fingerprint, Identity, member_scope};

/// Where an element lives: which parent, which collection, which identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ElementKey {
    pub(crate) parent: Fingerprint,
    /// lowercase member name
    pub(crate) member: String,
    pub(crate) element: Fingerprint,
}

/// Indices of elements already appended to collections below one root.
///
/// A collection can be emptied behind the cache's back (a `null` resetting
/// the object that owns it), so a recorded index is only trusted while the
/// element appended there is still the one it was recorded for.
#[derive(Debug, Default)]
pub(crate) struct ElementSlots {
    positions: HashMap<ElementKey, usize>,
    /// (collection scope, index) -> identity of the element appended there
    occupants: HashMap<(Fingerprint, usize), Fingerprint>,
}

impl ElementSlots {
    /// Index of the element with this key, if it still sits where it was
    /// appended.
    pub(crate) fn position(&self, key: &ElementKey) -> Option<usize> {
        let index = *self.positions.get(key)?;
        let occupant = self
            .occupants
            .get(&(member_scope(key.parent, &key.member), index))?;
        (*occupant == key.element).then_some(index)
    }

    /// Records that the element identified by `key` was appended at `index`.
    ///
    /// Fresh elements only claim the index; they can never be found again.
    pub(crate) fn record(&mut self, key: ElementKey, index: usize, fresh: bool) {
        self.occupants
            .insert((member_scope(key.parent, &key.member), index), key.element);
        if !fresh {
            self.positions.insert(key, index);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }
}

struct RootEntry {
    type_id: TypeId,
    fingerprint: Fingerprint,
    value: Box<dyn Any>,
    elements: ElementSlots,
}

/// Identity-keyed instance store for one mapping scope.
///
/// Roots are owned by the cache. Collection elements are owned by the
/// collection holding them; the cache remembers their position, so a later
/// record with the same identity updates the element in place instead of
/// appending a duplicate.
#[derive(Default)]
pub struct InstanceCache {
    roots: Vec<RootEntry>,
    slots: HashMap<(TypeId, Fingerprint), usize>,
}

/// Index of a root instance inside an [`InstanceCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RootSlot(usize);

impl InstanceCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root with this identity, constructing and storing a new
    /// one on a miss. The flag is true if the root was just constructed.
    pub(crate) fn resolve_root(&mut self, shape: &'static Shape, identity: Identity) -> (bool, RootSlot) {
        let type_id = shape.type_id();
        let fingerprint = identity.fingerprint();
        if !identity.is_fresh() {
            if let Some(&index) = self.slots.get(&(type_id, fingerprint)) {
                return (false, RootSlot(index));
            }
        }

        let index = self.roots.len();
        self.roots.push(RootEntry {
            type_id,
            fingerprint,
            value: shape.instantiate(),
            elements: ElementSlots::default(),
        });
        if !identity.is_fresh() {
            self.slots.insert((type_id, fingerprint), index);
        }
        (true, RootSlot(index))
    }

    /// The root instance in `slot`, and the element positions recorded below
    /// it.
    pub(crate) fn root_mut(&mut self, slot: RootSlot) -> Option<(&mut dyn Any, &mut ElementSlots)> {
        self.roots
            .get_mut(slot.0)
            .map(|entry| (&mut *entry.value, &mut entry.elements))
    }

    /// The root instance in `slot`, if it is a `T`.
    pub(crate) fn root<T: Mappable>(&self, slot: RootSlot) -> Option<&T> {
        self.roots.get(slot.0)?.value.downcast_ref::<T>()
    }

    /// Iterates over the cached roots of type `T`, oldest first.
    pub fn roots<T: Mappable>(&self) -> impl Iterator<Item = &T> {
        self.roots
            .iter()
            .filter_map(|entry| entry.value.downcast_ref::<T>())
    }

    /// Removes the cached roots of type `T` and returns them, oldest first.
    ///
    /// Roots of other types stay cached.
    pub fn take_roots<T: Mappable>(&mut self) -> Vec<T> {
        let target = TypeId::of::<T>();
        let (taken, kept): (Vec<_>, Vec<_>) = core::mem::take(&mut self.roots)
            .into_iter()
            .partition(|entry| entry.type_id == target);

        self.roots = kept;
        self.slots = self
            .roots
            .iter()
            .enumerate()
            .map(|(index, entry)| ((entry.type_id, entry.fingerprint), index))
            .collect();

        taken
            .into_iter()
            .filter_map(|entry| entry.value.downcast::<T>().ok())
            .map(|root| *root)
            .collect()
    }

    /// Number of cached roots, across all types.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Drops every cached instance.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.slots.clear();
    }
}

impl core::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("roots", &self.roots.len())
            .field(
                "elements",
                &self.roots.iter().map(|r| r.elements.len()).sum::<usize>(),
            )
            .finish()
    }
}
