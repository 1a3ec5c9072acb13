use core::any::{Any, TypeId};
use core::fmt;

use super::{CollectionAdapter, Def, Field, ListDef, StructDef};
use crate::ScalarType;

/// Constructs a fresh, default-initialized value of the shape's type.
pub type DefaultValueFn = fn() -> Box<dyn Any>;

/// Resets the value behind `target` to its default. Returns `false` if
/// `target` is not of the shape's type.
pub type ResetFn = fn(target: &mut dyn Any) -> bool;

/// Schema for a type the mapping engine can populate.
///
/// Shapes are static: every [`crate::Mappable`] type exposes exactly one,
/// built at compile time.
pub struct Shape {
    /// Unique type identifier, provided by the compiler.
    pub id: fn() -> TypeId,

    /// The type's name without generic parameters, e.g. `Customer` or `Vec`.
    ///
    /// Naming conventions derive identifier candidates from this.
    pub type_identifier: &'static str,

    /// What kind of value this is and how to reach inside it.
    pub def: Def,

    /// Parameterless construction path.
    pub default_value: DefaultValueFn,

    /// Reset-in-place path, used when a record assigns `null`.
    pub reset: ResetFn,
}

impl Shape {
    /// Returns the type id of the described type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    /// Returns true if this shape describes `T`.
    #[inline]
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Builds a new default instance of the described type.
    #[inline]
    pub fn instantiate(&self) -> Box<dyn Any> {
        (self.default_value)()
    }

    /// Returns the scalar type, if this is a scalar shape.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.def {
            Def::Scalar(def) => Some(def.scalar_type),
            _ => None,
        }
    }

    /// Returns the struct definition, if this is a struct.
    pub fn struct_def(&'static self) -> Option<&'static StructDef> {
        match &self.def {
            Def::Struct(def) => Some(def),
            _ => None,
        }
    }

    /// Returns the fields of a struct shape, or an empty slice.
    pub fn fields(&self) -> &'static [Field] {
        match self.def {
            Def::Struct(def) => def.fields,
            _ => &[],
        }
    }

    /// Returns the list definition, if this is a list.
    pub fn list_def(&self) -> Option<ListDef> {
        match self.def {
            Def::List(def) => Some(def),
            _ => None,
        }
    }

    /// Peels off `Option` and `Box` layers and returns the shape underneath.
    ///
    /// `Option<Box<Employee>>` yields `Employee`.
    pub fn innermost(&'static self) -> &'static Shape {
        let mut shape = self;
        loop {
            match shape.def {
                Def::Option(def) => shape = def.t(),
                Def::Pointer(def) => shape = def.pointee(),
                _ => return shape,
            }
        }
    }

    /// Peels off a single `Option` layer, if any.
    pub fn without_option(&'static self) -> &'static Shape {
        match self.def {
            Def::Option(def) => def.t(),
            _ => self,
        }
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for Shape {}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.def {
            Def::Option(def) => write!(f, "Option<{}>", def.t()),
            Def::Pointer(def) => write!(f, "Box<{}>", def.pointee()),
            Def::List(def) => match def.adapter {
                CollectionAdapter::Growable => write!(f, "Vec<{}>", def.t()),
                CollectionAdapter::Fixed => write!(f, "Box<[{}]>", def.t()),
            },
            _ => f.write_str(self.type_identifier),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({self})")
    }
}
