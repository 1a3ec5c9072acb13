#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod macros;

mod impls;
#[doc(hidden)]
pub use impls::{boxed_default, clone_into, reset_in_place};

mod scalar;
pub use scalar::*;

mod types;
pub use types::*;

mod value;
pub use value::*;

/// Allows the mapping engine to construct and populate values of a type.
///
/// Implemented for std scalars, `uuid::Uuid`, `Option<T>`, `Box<T>`,
/// `Vec<T>` and `Box<[T]>`. Structs and unit enums implement it through
/// [`mappable!`] and [`mappable_enum!`].
pub trait Mappable: core::any::Any + Default {
    /// The static shape of the type.
    const SHAPE: &'static Shape;
}

/// Returns the shape of `T`.
#[inline]
pub fn shape_of<T: Mappable>() -> &'static Shape {
    T::SHAPE
}
