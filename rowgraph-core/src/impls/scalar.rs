use core::any::TypeId;

use uuid::Uuid;

use super::{boxed_default, reset_in_place};
use crate::{Def, Mappable, ScalarDef, ScalarType, Shape, Value};

macro_rules! impl_scalar {
    ($($ty:ty => $scalar:ident, $name:literal;)*) => {
        $(
            impl Mappable for $ty {
                const SHAPE: &'static Shape = &const {
                    Shape {
                        id: TypeId::of::<$ty>,
                        type_identifier: $name,
                        def: Def::Scalar(ScalarDef {
                            scalar_type: ScalarType::$scalar,
                            assign: |target, value| {
                                let Some(target) = target.downcast_mut::<$ty>() else {
                                    return Err(value);
                                };
                                match value {
                                    Value::$scalar(v) => {
                                        *target = v;
                                        Ok(())
                                    }
                                    other => Err(other),
                                }
                            },
                        }),
                        default_value: boxed_default::<$ty>,
                        reset: reset_in_place::<$ty>,
                    }
                };
            }
        )*
    };
}

impl_scalar! {
    bool => Bool, "bool";
    char => Char, "char";
    String => String, "String";
    i8 => I8, "i8";
    i16 => I16, "i16";
    i32 => I32, "i32";
    i64 => I64, "i64";
    u8 => U8, "u8";
    u16 => U16, "u16";
    u32 => U32, "u32";
    u64 => U64, "u64";
    f32 => F32, "f32";
    f64 => F64, "f64";
    Uuid => Uuid, "Uuid";
}
