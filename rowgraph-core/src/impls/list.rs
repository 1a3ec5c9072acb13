use core::any::{Any, TypeId};

use super::{boxed_default, reset_in_place};
use crate::{CollectionAdapter, Def, ListDef, ListVTable, Mappable, Shape};

impl<T: Mappable> Mappable for Vec<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            id: TypeId::of::<Self>,
            type_identifier: "Vec",
            def: Def::List(ListDef {
                vtable: &const {
                    ListVTable {
                        len: |list| list.downcast_ref::<Self>().map(|list| list.len()),
                        get_mut: |list, index| {
                            let list = list.downcast_mut::<Self>()?;
                            list.get_mut(index).map(|item| item as &mut dyn Any)
                        },
                        push: |list, item| {
                            let Some(list) = list.downcast_mut::<Self>() else {
                                return Err(item);
                            };
                            let item = item.downcast::<T>()?;
                            list.push(*item);
                            Ok(list.len() - 1)
                        },
                    }
                },
                adapter: CollectionAdapter::Growable,
                t: || T::SHAPE,
            }),
            default_value: boxed_default::<Self>,
            reset: reset_in_place::<Self>,
        }
    };
}

impl<T: Mappable> Mappable for Box<[T]> {
    const SHAPE: &'static Shape = &const {
        Shape {
            id: TypeId::of::<Self>,
            type_identifier: "Box",
            def: Def::List(ListDef {
                vtable: &const {
                    ListVTable {
                        len: |list| list.downcast_ref::<Self>().map(|list| list.len()),
                        get_mut: |list, index| {
                            let list = list.downcast_mut::<Self>()?;
                            list.get_mut(index).map(|item| item as &mut dyn Any)
                        },
                        push: |list, item| {
                            let Some(list) = list.downcast_mut::<Self>() else {
                                return Err(item);
                            };
                            let item = item.downcast::<T>()?;
                            // fixed-size: rebuild with the element appended
                            let mut items = core::mem::take(list).into_vec();
                            items.push(*item);
                            *list = items.into_boxed_slice();
                            Ok(list.len() - 1)
                        },
                    }
                },
                adapter: CollectionAdapter::Fixed,
                t: || T::SHAPE,
            }),
            default_value: boxed_default::<Self>,
            reset: reset_in_place::<Self>,
        }
    };
}
