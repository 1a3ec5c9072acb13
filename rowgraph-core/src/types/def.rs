use core::any::Any;

use super::{Field, Shape};
use crate::{ScalarType, Value};

/// The semantic definition of a shape: is it a scalar, a struct, a list?
#[derive(Clone, Copy)]
#[non_exhaustive]
pub enum Def {
    /// Leaf values assigned straight from a record cell.
    ///
    /// e.g. `u32`, `String`, `bool`, `Uuid`
    Scalar(ScalarDef),

    /// Unit-only enums, selected by variant name or position.
    Enum(EnumDef),

    /// `Option<T>`: absent until a record provides something for it.
    Option(OptionDef),

    /// `Box<T>`: transparent owning pointer.
    Pointer(PointerDef),

    /// Named fields, populated member by member.
    Struct(StructDef),

    /// Homogeneous sequences, populated element by element.
    ///
    /// e.g. `Vec<T>`, `Box<[T]>`
    List(ListDef),
}

/// Stores `value` into `target`, which must be of the shape's type.
///
/// The value is handed back when it does not have exactly the kind the
/// target expects (or `target` is of another type).
pub type AssignFn = fn(target: &mut dyn Any, value: Value) -> Result<(), Value>;

/// Definition for scalar shapes.
#[derive(Clone, Copy, Debug)]
pub struct ScalarDef {
    /// Which scalar this is.
    pub scalar_type: ScalarType,
    /// Exact-kind assignment.
    pub assign: AssignFn,
}

/// Definition for unit enums.
#[derive(Clone, Copy, Debug)]
pub struct EnumDef {
    /// Variant names, in declaration order.
    pub variants: &'static [&'static str],
    /// Accepts [`Value::Variant`] only.
    pub assign: AssignFn,
}

impl EnumDef {
    /// Finds a variant by name, ignoring ASCII case.
    pub fn variant_index(&self, name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.eq_ignore_ascii_case(name))
    }
}

/// Returns true if the option holds a value.
pub type OptionIsSomeFn = fn(option: &dyn Any) -> bool;

/// Returns the value inside the option, inserting a default one first if the
/// option is `None`.
pub type OptionGetOrInsertFn = fn(option: &mut dyn Any) -> Option<&mut dyn Any>;

/// Sets the option to `None`. Returns `false` on a type mismatch.
pub type OptionSetNoneFn = fn(option: &mut dyn Any) -> bool;

/// Virtual table for `Option<T>`.
#[derive(Clone, Copy, Debug)]
pub struct OptionVTable {
    /// cf. [`OptionIsSomeFn`]
    pub is_some: OptionIsSomeFn,
    /// cf. [`OptionGetOrInsertFn`]
    pub get_or_insert_default: OptionGetOrInsertFn,
    /// cf. [`OptionSetNoneFn`]
    pub set_none: OptionSetNoneFn,
}

/// Describes an `Option<T>`: its vtable and the inner shape.
#[derive(Clone, Copy, Debug)]
pub struct OptionDef {
    /// vtable for interacting with the option
    pub vtable: &'static OptionVTable,
    /// shape of the inner type, behind a thunk so recursive types work
    pub t: fn() -> &'static Shape,
}

impl OptionDef {
    /// Returns the inner type shape.
    #[inline]
    pub fn t(&self) -> &'static Shape {
        (self.t)()
    }
}

/// Borrows the pointee of an owning pointer.
pub type PointerBorrowMutFn = fn(pointer: &mut dyn Any) -> Option<&mut dyn Any>;

/// Describes an owning pointer such as `Box<T>`.
#[derive(Clone, Copy, Debug)]
pub struct PointerDef {
    /// shape of the pointee
    pub pointee: fn() -> &'static Shape,
    /// cf. [`PointerBorrowMutFn`]
    pub borrow_mut: PointerBorrowMutFn,
}

impl PointerDef {
    /// Returns the pointee shape.
    #[inline]
    pub fn pointee(&self) -> &'static Shape {
        (self.pointee)()
    }
}

/// Overwrites `target` with a clone of `source`. Returns `false` if either
/// is not of the shape's type.
pub type CloneIntoFn = fn(source: &dyn Any, target: &mut dyn Any) -> bool;

/// Describes a struct: its fields, in declaration order.
#[derive(Clone, Copy, Debug)]
pub struct StructDef {
    /// all fields, in declaration order
    pub fields: &'static [Field],

    /// Present when the struct is `Clone` and opted in with `#[clone]`.
    ///
    /// Members typed like their owner are wired to a copy of that owner.
    pub clone_into: Option<CloneIntoFn>,
}

/// How a list grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionAdapter {
    /// `Vec<T>`: elements are pushed in place.
    Growable,
    /// `Box<[T]>`: the sequence is rebuilt with the element appended.
    Fixed,
}

/// Number of elements in the list, or `None` on a type mismatch.
pub type ListLenFn = fn(list: &dyn Any) -> Option<usize>;

/// Mutable access to the element at `index`.
pub type ListGetMutFn = fn(list: &mut dyn Any, index: usize) -> Option<&mut dyn Any>;

/// Appends `item` and returns its index. The item is handed back if either
/// the list or the item has an unexpected type.
pub type ListPushFn = fn(list: &mut dyn Any, item: Box<dyn Any>) -> Result<usize, Box<dyn Any>>;

/// Virtual table for lists.
#[derive(Clone, Copy, Debug)]
pub struct ListVTable {
    /// cf. [`ListLenFn`]
    pub len: ListLenFn,
    /// cf. [`ListGetMutFn`]
    pub get_mut: ListGetMutFn,
    /// cf. [`ListPushFn`]
    pub push: ListPushFn,
}

/// Describes a list: element shape, adapter and vtable.
#[derive(Clone, Copy, Debug)]
pub struct ListDef {
    /// vtable for interacting with the list
    pub vtable: &'static ListVTable,
    /// growable or fixed-size
    pub adapter: CollectionAdapter,
    /// shape of the items in the list
    pub t: fn() -> &'static Shape,
}

impl ListDef {
    /// Returns the shape of the items in the list.
    #[inline]
    pub fn t(&self) -> &'static Shape {
        (self.t)()
    }
}
