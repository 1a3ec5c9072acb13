//! Per-type metadata discovery: members, their kinds, and which of them
//! carry identity.

use alloc::sync::Arc;
use core::any::TypeId;
use std::collections::HashMap;

use parking_lot::RwLock;
use rowgraph_core::{CollectionAdapter, Def, Field, Mappable, Shape};

use crate::Configuration;

/// How the engine populates a member.
#[derive(Clone, Copy, Debug)]
pub enum MemberKind {
    /// Assigned straight from one record value (scalars, unit enums, and
    /// `Option`/`Box` around them).
    Simple {
        /// The scalar or enum underneath any `Option`/`Box` layers.
        leaf: &'static Shape,
    },
    /// A single nested struct, populated from the member's key namespace.
    Object {
        /// The struct underneath any `Option`/`Box` layers.
        target: &'static Shape,
    },
    /// A list of structs; each nested record resolves to one element.
    Collection {
        /// The list underneath any `Option`/`Box` layers.
        list: &'static Shape,
        /// Growable or fixed-size.
        adapter: CollectionAdapter,
        /// The element struct.
        element: &'static Shape,
    },
    /// Nothing the engine knows how to populate, e.g. a list of scalars.
    Unsupported,
}

impl MemberKind {
    /// Classifies a declared member type.
    pub fn of(shape: &'static Shape) -> MemberKind {
        let inner = shape.innermost();
        match inner.def {
            Def::Scalar(_) | Def::Enum(_) => MemberKind::Simple { leaf: inner },
            Def::Struct(_) => MemberKind::Object { target: inner },
            Def::List(def) if def.t().struct_def().is_some() => MemberKind::Collection {
                list: inner,
                adapter: def.adapter,
                element: def.t(),
            },
            _ => MemberKind::Unsupported,
        }
    }

    /// Returns true for members populated from a key namespace.
    pub fn is_complex(&self) -> bool {
        matches!(self, MemberKind::Object { .. } | MemberKind::Collection { .. })
    }
}

/// A settable member of a struct, as the engine sees it.
#[derive(Clone, Debug)]
pub struct Member {
    /// Name records use to address the member.
    pub name: String,
    /// The field handle: declared shape and projection.
    pub field: Field,
    /// Precomputed classification of the declared type.
    pub kind: MemberKind,
}

impl Member {
    /// The member's declared shape.
    pub fn shape(&self) -> &'static Shape {
        self.field.shape()
    }
}

/// Cached metadata about a target type.
///
/// Immutable once computed; shared through `Arc` until invalidated.
#[derive(Debug)]
pub struct TypeDescriptor {
    shape: &'static Shape,
    members: Vec<Member>,
    // lowercase member name -> index into `members`
    by_name: HashMap<String, usize>,
    identifiers: Vec<String>,
}

impl TypeDescriptor {
    /// Computes the descriptor of `shape` under `configuration`.
    pub fn compute(shape: &'static Shape, configuration: &Configuration) -> TypeDescriptor {
        let members: Vec<Member> = shape
            .fields()
            .iter()
            .map(|field| Member {
                name: field.member_name().into_owned(),
                field: *field,
                kind: MemberKind::of(field.shape()),
            })
            .collect();

        let mut by_name = HashMap::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            by_name.entry(member.name.to_lowercase()).or_insert(index);
        }

        let mut descriptor = TypeDescriptor {
            shape,
            members,
            by_name,
            identifiers: Vec::new(),
        };
        descriptor.identifiers = descriptor.discover_identifiers(configuration);

        debug!(
            shape = %shape,
            members = descriptor.members.len(),
            identifiers = ?descriptor.identifiers,
            "described type"
        );
        descriptor
    }

    fn discover_identifiers(&self, configuration: &Configuration) -> Vec<String> {
        let explicit = configuration.explicit_identifiers(self.shape.type_id());
        let marked: Vec<String> = self
            .members
            .iter()
            .filter(|member| {
                member.field.is_identifier()
                    || explicit
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&member.name))
            })
            .map(|member| member.name.clone())
            .collect();
        if !marked.is_empty() {
            return marked;
        }

        configuration
            .identifier_candidates(self.shape)
            .into_iter()
            .find_map(|candidate| self.member(&candidate).map(|member| member.name.clone()))
            .into_iter()
            .collect()
    }

    /// The described type.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Finds a member by name, ignoring case.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.by_name
            .get(name.to_lowercase().as_str())
            .map(|&index| &self.members[index])
    }

    /// Names of the identity-bearing members, in discovery order.
    pub fn identifier_names(&self) -> &[String] {
        &self.identifiers
    }

    /// Returns true if the type has at least one identifier.
    pub fn has_identifiers(&self) -> bool {
        !self.identifiers.is_empty()
    }

    /// Returns true if a nested object member is of type `owner`, i.e. the
    /// type can point back at a struct that holds it.
    pub fn refers_to(&self, owner: &Shape) -> bool {
        self.members
            .iter()
            .any(|member| matches!(member.kind, MemberKind::Object { target } if target == owner))
    }
}

/// Memoizes [`TypeDescriptor`]s per type.
#[derive(Debug, Default)]
pub struct TypeIntrospector {
    descriptors: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl TypeIntrospector {
    /// Creates an empty introspector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor of `shape`, computing it on first use.
    ///
    /// Concurrent first uses may each compute a descriptor, but only the
    /// first one committed is ever handed out.
    pub fn describe(&self, shape: &'static Shape, configuration: &Configuration) -> Arc<TypeDescriptor> {
        let type_id = shape.type_id();
        if let Some(descriptor) = self.descriptors.read().get(&type_id) {
            return Arc::clone(descriptor);
        }

        let computed = Arc::new(TypeDescriptor::compute(shape, configuration));
        Arc::clone(self.descriptors.write().entry(type_id).or_insert(computed))
    }

    /// Returns the cached descriptor of `shape` without computing one.
    pub fn cached(&self, shape: &'static Shape) -> Option<Arc<TypeDescriptor>> {
        self.descriptors.read().get(&shape.type_id()).cloned()
    }

    /// Drops every cached descriptor.
    pub fn invalidate(&self) {
        self.descriptors.write().clear();
    }

    /// Drops the cached descriptor of `T`.
    pub fn invalidate_type<T: Mappable>(&self) {
        self.descriptors.write().remove(&TypeId::of::<T>());
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowgraph_core::mappable;

    #[derive(Default)]
    struct Line {
        sku: String,
    }

    #[derive(Default)]
    struct Address {
        street: String,
    }

    #[derive(Default)]
    struct Order {
        order_id: i64,
        id: i32,
        note: Option<String>,
        address: Option<Box<Address>>,
        lines: Vec<Line>,
        archived: Option<Box<[Line]>>,
        tags: Vec<String>,
    }

    mappable!(Line { sku: String });
    mappable!(Address { street: String });
    mappable!(Order {
        order_id: i64,
        id: i32,
        note: Option<String>,
        address: Option<Box<Address>>,
        lines: Vec<Line>,
        archived: Option<Box<[Line]>>,
        tags: Vec<String>,
    });

    #[derive(Default)]
    struct Keyed {
        region: String,
        number: u32,
        label: String,
    }

    mappable!(Keyed {
        #[id] region: String,
        #[id] number: u32,
        label: String,
    });

    fn kind(descriptor: &TypeDescriptor, name: &str) -> MemberKind {
        descriptor.member(name).unwrap().kind
    }

    #[test]
    fn members_are_classified() {
        let descriptor = TypeDescriptor::compute(Order::SHAPE, &Configuration::new());
        assert_eq!(descriptor.members().len(), 7);

        assert!(matches!(kind(&descriptor, "Note"), MemberKind::Simple { leaf } if leaf.is_type::<String>()));
        assert!(matches!(kind(&descriptor, "address"), MemberKind::Object { target } if target.is_type::<Address>()));
        assert!(matches!(
            kind(&descriptor, "LINES"),
            MemberKind::Collection { adapter: CollectionAdapter::Growable, element, .. } if element.is_type::<Line>()
        ));
        assert!(matches!(
            kind(&descriptor, "Archived"),
            MemberKind::Collection { adapter: CollectionAdapter::Fixed, .. }
        ));
        assert!(matches!(kind(&descriptor, "Tags"), MemberKind::Unsupported));
    }

    #[test]
    fn nested_object_members_refer_to_their_type() {
        let order = TypeDescriptor::compute(Order::SHAPE, &Configuration::new());
        assert!(order.refers_to(Address::SHAPE));
        assert!(!order.refers_to(Line::SHAPE));

        let line = TypeDescriptor::compute(Line::SHAPE, &Configuration::new());
        assert!(!line.refers_to(Order::SHAPE));
    }

    #[test]
    fn first_matching_convention_wins() {
        let descriptor = TypeDescriptor::compute(Order::SHAPE, &Configuration::new());
        assert_eq!(descriptor.identifier_names(), ["Id"]);

        let config = Configuration::new()
            .with_convention(|_| "Missing".to_owned())
            .with_convention(|shape| format!("{}Id", shape.type_identifier))
            .with_convention(|_| "Id".to_owned());
        let descriptor = TypeDescriptor::compute(Order::SHAPE, &config);
        assert_eq!(descriptor.identifier_names(), ["OrderId"]);
    }

    #[test]
    fn markers_replace_conventions() {
        let descriptor = TypeDescriptor::compute(Keyed::SHAPE, &Configuration::new());
        assert_eq!(descriptor.identifier_names(), ["Region", "Number"]);

        let config = Configuration::new().with_identifier::<Keyed>("label");
        let descriptor = TypeDescriptor::compute(Keyed::SHAPE, &config);
        assert_eq!(descriptor.identifier_names(), ["Region", "Number", "Label"]);
    }

    #[test]
    fn explicit_identifiers_replace_conventions() {
        let config = Configuration::new().with_identifier::<Order>("note");
        let descriptor = TypeDescriptor::compute(Order::SHAPE, &config);
        assert_eq!(descriptor.identifier_names(), ["Note"]);
    }

    #[test]
    fn no_candidate_means_no_identity() {
        let descriptor = TypeDescriptor::compute(Line::SHAPE, &Configuration::new());
        assert!(!descriptor.has_identifiers());

        let descriptor = TypeDescriptor::compute(u32::SHAPE, &Configuration::new());
        assert!(descriptor.members().is_empty());
        assert!(!descriptor.has_identifiers());
    }

    #[test]
    fn descriptors_are_memoized_until_invalidated() {
        let introspector = TypeIntrospector::new();
        let config = Configuration::new();

        let first = introspector.describe(Order::SHAPE, &config);
        let second = introspector.describe(Order::SHAPE, &config);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(introspector.len(), 1);

        introspector.describe(Line::SHAPE, &config);
        introspector.invalidate_type::<Order>();
        assert!(introspector.cached(Order::SHAPE).is_none());
        assert!(introspector.cached(Line::SHAPE).is_some());

        let third = introspector.describe(Order::SHAPE, &config);
        assert!(!Arc::ptr_eq(&first, &third));

        introspector.invalidate();
        assert!(introspector.is_empty());
    }
}
