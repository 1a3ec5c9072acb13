//! Scalar type identification for shapes.

use core::fmt;

use crate::{Value, ValueKind};

/// All scalar types a member can be declared as.
///
/// A scalar location only ever accepts a [`Value`] of the matching
/// [`ValueKind`]; everything else goes through the converter chain first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ScalarType {
    /// Primitive type `bool`.
    Bool,
    /// Primitive type `char`.
    Char,
    /// `String`.
    String,
    /// Primitive type `i8`.
    I8,
    /// Primitive type `i16`.
    I16,
    /// Primitive type `i32`.
    I32,
    /// Primitive type `i64`.
    I64,
    /// Primitive type `u8`.
    U8,
    /// Primitive type `u16`.
    U16,
    /// Primitive type `u32`.
    U32,
    /// Primitive type `u64`.
    U64,
    /// Primitive type `f32`.
    F32,
    /// Primitive type `f64`.
    F64,
    /// `uuid::Uuid`.
    Uuid,
}

impl ScalarType {
    /// The value kind a location of this type accepts without conversion.
    pub const fn value_kind(self) -> ValueKind {
        match self {
            ScalarType::Bool => ValueKind::Bool,
            ScalarType::Char => ValueKind::Char,
            ScalarType::String => ValueKind::String,
            ScalarType::I8 => ValueKind::I8,
            ScalarType::I16 => ValueKind::I16,
            ScalarType::I32 => ValueKind::I32,
            ScalarType::I64 => ValueKind::I64,
            ScalarType::U8 => ValueKind::U8,
            ScalarType::U16 => ValueKind::U16,
            ScalarType::U32 => ValueKind::U32,
            ScalarType::U64 => ValueKind::U64,
            ScalarType::F32 => ValueKind::F32,
            ScalarType::F64 => ValueKind::F64,
            ScalarType::Uuid => ValueKind::Uuid,
        }
    }

    /// Returns true if `value` can be stored as-is.
    pub fn accepts(self, value: &Value) -> bool {
        value.kind() == self.value_kind()
    }

    /// Returns true for the integer types.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarType::I8
                | ScalarType::I16
                | ScalarType::I32
                | ScalarType::I64
                | ScalarType::U8
                | ScalarType::U16
                | ScalarType::U32
                | ScalarType::U64
        )
    }

    /// Returns true for `f32` and `f64`.
    pub const fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// The inclusive range of an integer type, widened to `i128`.
    pub const fn integer_bounds(self) -> Option<(i128, i128)> {
        Some(match self {
            ScalarType::I8 => (i8::MIN as i128, i8::MAX as i128),
            ScalarType::I16 => (i16::MIN as i128, i16::MAX as i128),
            ScalarType::I32 => (i32::MIN as i128, i32::MAX as i128),
            ScalarType::I64 => (i64::MIN as i128, i64::MAX as i128),
            ScalarType::U8 => (0, u8::MAX as i128),
            ScalarType::U16 => (0, u16::MAX as i128),
            ScalarType::U32 => (0, u32::MAX as i128),
            ScalarType::U64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value_kind().name())
    }
}
