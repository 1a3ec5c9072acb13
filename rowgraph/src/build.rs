//! Graph construction: walking a type's members and populating them from a
//! flat record, recursing into key namespaces for nested members.

use alloc::sync::Arc;
use core::any::Any;
use core::borrow::Borrow;
use std::collections::HashSet;

use rowgraph_core::{Def, Shape, Value, ValueKind};

use crate::cache::{ElementKey, ElementSlots};
use crate::{
    accepts, Configuration, Fingerprint, FlatRecord, InstanceCache, MapError, MapErrorKind, Member,
    MemberFailure, MemberKind, RootSlot, TypeDescriptor, TypeIntrospector, member_scope, resolve,
};

/// Walks `Option` and `Box` layers down to the first other shape, filling
/// unset options with defaults on the way.
fn materialize<'a>(mut shape: &'static Shape, mut location: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
    loop {
        location = match shape.def {
            Def::Option(def) => {
                shape = def.t();
                (def.vtable.get_or_insert_default)(location)?
            }
            Def::Pointer(def) => {
                shape = def.pointee();
                (def.borrow_mut)(location)?
            }
            _ => return Some(location),
        };
    }
}

/// A copy of the instance that owns the members being populated.
///
/// Members typed like their owner, with no keys of their own, receive a
/// clone of it. The copy never holds the member it was taken for, so owner
/// copies nest one level per ancestor instead of compounding.
#[derive(Clone, Copy)]
struct Owner<'p> {
    shape: &'static Shape,
    snapshot: &'p dyn Any,
}

/// Populates instances of one mapping call.
pub(crate) struct GraphBuilder<'a> {
    introspector: &'a TypeIntrospector,
    configuration: &'a Configuration,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(introspector: &'a TypeIntrospector, configuration: &'a Configuration) -> Self {
        GraphBuilder {
            introspector,
            configuration,
        }
    }

    fn describe(&self, shape: &'static Shape) -> Arc<TypeDescriptor> {
        self.introspector.describe(shape, self.configuration)
    }

    /// Maps every record onto a root of type `shape` held in `cache`.
    ///
    /// Returns the roots touched by these records, in first-touch order.
    pub(crate) fn map_records<R>(
        &self,
        shape: &'static Shape,
        records: impl IntoIterator<Item = R>,
        cache: &mut InstanceCache,
    ) -> Result<Vec<RootSlot>, MapError>
    where
        R: Borrow<FlatRecord>,
    {
        if shape.struct_def().is_none() {
            return Err(MapError::new(MapErrorKind::NotAStruct { shape }));
        }
        let descriptor = self.describe(shape);

        let mut touched = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            let record = record.borrow();
            let identity = resolve(&descriptor, record, 0);
            let (is_new, slot) = cache.resolve_root(shape, identity);
            if is_new {
                trace!(shape = %shape, ?identity, "new root");
            } else {
                trace!(shape = %shape, ?identity, "cached root");
            }

            if let Some((root, elements)) = cache.root_mut(slot) {
                self.populate(record, root, &descriptor, identity.fingerprint(), elements, None)?;
            }
            if seen.insert(slot) {
                touched.push(slot);
            }
        }

        debug!(shape = %shape, roots = touched.len(), "mapped records");
        Ok(touched)
    }

    /// Populates `instance` (described by `descriptor`) from `record`.
    ///
    /// `fingerprint` is the instance's own identity; it scopes the elements
    /// of its collections and the identity of its nested objects. `owner` is
    /// set when the instance is an element or nested object of a struct
    /// declared with `#[clone]`.
    fn populate(
        &self,
        record: &FlatRecord,
        instance: &mut dyn Any,
        descriptor: &TypeDescriptor,
        fingerprint: Fingerprint,
        elements: &mut ElementSlots,
        owner: Option<Owner<'_>>,
    ) -> Result<(), MapError> {
        for member in descriptor.members() {
            if let Some(value) = record.get(&member.name) {
                self.assign(descriptor, member, instance, value.clone())
                    .map_err(|e| e.within(&member.name))?;
                continue;
            }

            if !member.kind.is_complex() {
                continue;
            }
            let Some(nested) = record.namespace(&member.name) else {
                match (member.kind, owner) {
                    (MemberKind::Object { target }, Some(owner)) if target == owner.shape => {
                        self.wire_owner(descriptor, member, instance, owner)
                            .map_err(|e| e.within(&member.name))?;
                    }
                    _ => {
                        trace!(member = %member.name, "no keys, skipping");
                    }
                }
                continue;
            };

            let populated = match member.kind {
                MemberKind::Object { target } => {
                    self.populate_object(descriptor, member, target, instance, &nested, fingerprint, elements)
                }
                MemberKind::Collection { list, element, .. } => self.populate_collection(
                    descriptor,
                    member,
                    list,
                    element,
                    instance,
                    &nested,
                    fingerprint,
                    elements,
                ),
                MemberKind::Simple { .. } | MemberKind::Unsupported => Ok(()),
            };
            populated.map_err(|e| e.within(&member.name))?;
        }
        Ok(())
    }

    /// Stores a value found under the member's own key.
    fn assign(
        &self,
        descriptor: &TypeDescriptor,
        member: &Member,
        instance: &mut dyn Any,
        value: Value,
    ) -> Result<(), MapError> {
        let target = member.shape();
        let source_type = value.kind();
        let Some(location) = (member.field.project)(instance) else {
            return Err(assignment(descriptor, member, value, source_type));
        };

        let leaf = match member.kind {
            MemberKind::Simple { leaf } => leaf,
            MemberKind::Collection { .. } if value.is_null() => {
                // a null collection is an empty one, never an unset one
                materialize(target, location);
                return Ok(());
            }
            _ if value.is_null() => {
                (target.reset)(location);
                return Ok(());
            }
            _ => return Err(assignment(descriptor, member, value, source_type)),
        };

        if value.is_null() {
            trace!(member = %member.name, "reset");
            (target.reset)(location);
            return Ok(());
        }

        let converted = self
            .configuration
            .converters()
            .convert(value.clone(), target)
            .map_err(|e| {
                MapError::new(MapErrorKind::Conversion(MemberFailure {
                    reason: Some(e.reason().to_owned()),
                    ..failure(descriptor, member, value, source_type)
                }))
            })?;

        let assign = match leaf.def {
            Def::Scalar(def) => def.assign,
            Def::Enum(def) => def.assign,
            _ => return Err(assignment(descriptor, member, converted, source_type)),
        };
        // reject before an unset option gets filled in
        if !accepts(leaf, &converted) {
            return Err(assignment(descriptor, member, converted, source_type));
        }
        let Some(location) = materialize(target, location) else {
            return Err(assignment(descriptor, member, converted, source_type));
        };
        trace!(member = %member.name, value = %converted, "assign");
        assign(location, converted)
            .map_err(|rejected| assignment(descriptor, member, rejected, source_type))
    }

    /// Copies `instance` for the members of `child` typed like it, if its
    /// type opted in with `#[clone]`. The copy has `member` reset.
    fn snapshot(
        &self,
        descriptor: &TypeDescriptor,
        member: &Member,
        instance: &dyn Any,
        child: &TypeDescriptor,
    ) -> Option<Box<dyn Any>> {
        let shape = descriptor.shape();
        let clone_into = shape.struct_def()?.clone_into?;
        if !child.refers_to(shape) {
            return None;
        }

        let mut snapshot = shape.instantiate();
        if !clone_into(instance, &mut *snapshot) {
            return None;
        }
        if let Some(location) = (member.field.project)(&mut *snapshot) {
            (member.shape().reset)(location);
        }
        Some(snapshot)
    }

    /// Stores a copy of the owning instance in `member`.
    fn wire_owner(
        &self,
        descriptor: &TypeDescriptor,
        member: &Member,
        instance: &mut dyn Any,
        owner: Owner<'_>,
    ) -> Result<(), MapError> {
        let clone_into = owner.shape.struct_def().and_then(|def| def.clone_into);
        let location = (member.field.project)(instance)
            .and_then(|location| materialize(member.shape(), location));
        let (Some(clone_into), Some(location)) = (clone_into, location) else {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        };
        if !clone_into(owner.snapshot, location) {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        }
        trace!(member = %member.name, owner = %owner.shape, "wired to owner");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn populate_object(
        &self,
        descriptor: &TypeDescriptor,
        member: &Member,
        target: &'static Shape,
        instance: &mut dyn Any,
        nested: &FlatRecord,
        fingerprint: Fingerprint,
        elements: &mut ElementSlots,
    ) -> Result<(), MapError> {
        let object_descriptor = self.describe(target);
        let snapshot = self.snapshot(descriptor, member, instance, &object_descriptor);

        let object = (member.field.project)(instance)
            .and_then(|location| materialize(member.shape(), location));
        let Some(object) = object else {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        };

        self.populate(
            nested,
            object,
            &object_descriptor,
            member_scope(fingerprint, &member.name),
            elements,
            owner_of(descriptor, snapshot.as_deref()),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn populate_collection(
        &self,
        descriptor: &TypeDescriptor,
        member: &Member,
        list_shape: &'static Shape,
        element_shape: &'static Shape,
        instance: &mut dyn Any,
        nested: &FlatRecord,
        fingerprint: Fingerprint,
        elements: &mut ElementSlots,
    ) -> Result<(), MapError> {
        let Some(list_def) = list_shape.list_def() else {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        };
        let list = (member.field.project)(instance)
            .and_then(|location| materialize(member.shape(), location));
        if list.is_none() {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        }

        if nested.all_null() {
            trace!(member = %member.name, "all null, empty collection");
            return Ok(());
        }

        let element_descriptor = self.describe(element_shape);
        let snapshot = self.snapshot(descriptor, member, instance, &element_descriptor);
        let owner = owner_of(descriptor, snapshot.as_deref());

        let list = (member.field.project)(instance)
            .and_then(|location| materialize(member.shape(), location));
        let Some(list) = list else {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        };

        let identity = resolve(&element_descriptor, nested, fingerprint);
        let key = ElementKey {
            parent: fingerprint,
            member: member.name.to_lowercase(),
            element: identity.fingerprint(),
        };

        if !identity.is_fresh() {
            if let Some(index) = elements.position(&key) {
                if let Some(existing) = (list_def.vtable.get_mut)(list, index) {
                    trace!(member = %member.name, index, "reusing element");
                    return self.populate(
                        nested,
                        existing,
                        &element_descriptor,
                        identity.fingerprint(),
                        elements,
                        owner,
                    );
                }
            }
        }

        let mut element = element_shape.instantiate();
        self.populate(
            nested,
            &mut *element,
            &element_descriptor,
            identity.fingerprint(),
            elements,
            owner,
        )?;
        let Ok(index) = (list_def.vtable.push)(list, element) else {
            return Err(assignment(descriptor, member, Value::Null, ValueKind::Null));
        };
        trace!(member = %member.name, index, adapter = ?list_def.adapter, "appended element");

        elements.record(key, index, identity.is_fresh());
        Ok(())
    }
}

fn owner_of<'p>(descriptor: &TypeDescriptor, snapshot: Option<&'p dyn Any>) -> Option<Owner<'p>> {
    snapshot.map(|snapshot| Owner {
        shape: descriptor.shape(),
        snapshot,
    })
}

fn failure(descriptor: &TypeDescriptor, member: &Member, value: Value, source_type: ValueKind) -> MemberFailure {
    MemberFailure {
        value,
        source_type,
        member: member.name.clone(),
        target_type: member.shape(),
        declaring_type: descriptor.shape().type_identifier,
        reason: None,
    }
}

fn assignment(descriptor: &TypeDescriptor, member: &Member, value: Value, source_type: ValueKind) -> MapError {
    MapError::new(MapErrorKind::Assignment(failure(
        descriptor,
        member,
        value,
        source_type,
    )))
}
