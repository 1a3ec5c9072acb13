use core::any::{Any, TypeId};

use super::{boxed_default, reset_in_place};
use crate::{Def, Mappable, OptionDef, OptionVTable, PointerDef, Shape};

impl<T: Mappable> Mappable for Option<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            id: TypeId::of::<Self>,
            type_identifier: "Option",
            def: Def::Option(OptionDef {
                vtable: &const {
                    OptionVTable {
                        is_some: |option| {
                            option
                                .downcast_ref::<Self>()
                                .is_some_and(|option| option.is_some())
                        },
                        get_or_insert_default: |option| {
                            let option = option.downcast_mut::<Self>()?;
                            Some(option.get_or_insert_with(T::default) as &mut dyn Any)
                        },
                        set_none: |option| match option.downcast_mut::<Self>() {
                            Some(option) => {
                                *option = None;
                                true
                            }
                            None => false,
                        },
                    }
                },
                t: || T::SHAPE,
            }),
            default_value: boxed_default::<Self>,
            reset: reset_in_place::<Self>,
        }
    };
}

impl<T: Mappable> Mappable for Box<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            id: TypeId::of::<Self>,
            type_identifier: "Box",
            def: Def::Pointer(PointerDef {
                pointee: || T::SHAPE,
                borrow_mut: |pointer| {
                    let pointer = pointer.downcast_mut::<Self>()?;
                    Some(&mut **pointer as &mut dyn Any)
                },
            }),
            default_value: boxed_default::<Self>,
            reset: reset_in_place::<Self>,
        }
    };
}
