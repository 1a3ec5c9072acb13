//! Shapes for std and `uuid` types.

use core::any::Any;

mod list;
mod option;
mod scalar;

/// Boxes a default `T`; the [`crate::Shape::default_value`] of every
/// built-in shape and of every `mappable!` type.
#[doc(hidden)]
pub fn boxed_default<T: Default + 'static>() -> Box<dyn Any> {
    Box::new(T::default())
}

/// Resets a `T` in place; the [`crate::Shape::reset`] of every built-in
/// shape and of every `mappable!` type.
#[doc(hidden)]
pub fn reset_in_place<T: Default + 'static>(target: &mut dyn Any) -> bool {
    match target.downcast_mut::<T>() {
        Some(target) => {
            *target = T::default();
            true
        }
        None => false,
    }
}

/// Clones a `T` over another; the [`crate::StructDef::clone_into`] of
/// `mappable!` types declared with `#[clone]`.
#[doc(hidden)]
pub fn clone_into<T: Clone + 'static>(source: &dyn Any, target: &mut dyn Any) -> bool {
    match (source.downcast_ref::<T>(), target.downcast_mut::<T>()) {
        (Some(source), Some(target)) => {
            target.clone_from(source);
            true
        }
        _ => false,
    }
}
