/// Implements [`Mappable`](crate::Mappable) for an existing struct.
///
/// List every field the engine should populate, with its type. Fields not
/// listed are left at their default. A field can carry markers (`#[id]`
/// flags it as an identifier) and an explicit member name (`as "Name"`);
/// without one, the member name is the field name in PascalCase.
///
/// The struct must implement `Default`. A struct that also implements
/// `Clone` can be declared as `#[clone] Name { .. }`: members typed like it
/// that no record key addresses then receive a copy of the owning instance.
///
/// ```
/// use rowgraph_core::{Mappable, mappable};
///
/// #[derive(Debug, Default)]
/// struct Order {
///     id: i32,
///     order_total: f64,
/// }
///
/// #[derive(Debug, Default)]
/// struct Customer {
///     customer_id: i32,
///     kind: String,
///     orders: Vec<Order>,
/// }
///
/// mappable!(Order { id: i32, order_total: f64 });
/// mappable!(Customer {
///     #[id] customer_id: i32,
///     kind: String as "Type",
///     orders: Vec<Order>,
/// });
///
/// let fields = Customer::SHAPE.fields();
/// assert_eq!(fields[0].member_name(), "CustomerId");
/// assert!(fields[0].is_identifier());
/// assert_eq!(fields[1].member_name(), "Type");
/// ```
#[macro_export]
macro_rules! mappable {
    (#[clone] $ty:ident { $($body:tt)* }) => {
        $crate::__mappable_struct!(
            $ty,
            ::core::option::Option::Some($crate::clone_into::<$ty>),
            { $($body)* }
        );
    };
    ($ty:ident { $($body:tt)* }) => {
        $crate::__mappable_struct!($ty, ::core::option::Option::None, { $($body)* });
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __mappable_struct {
    ($ty:ident, $clone_into:expr, {
        $(
            $(#[$marker:ident])*
            $field:ident : $fty:ty $(as $rename:literal)?
        ),* $(,)?
    }) => {
        impl $crate::Mappable for $ty {
            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape {
                    id: ::core::any::TypeId::of::<$ty>,
                    type_identifier: ::core::stringify!($ty),
                    def: $crate::Def::Struct($crate::StructDef {
                        fields: &[
                            $(
                                $crate::Field {
                                    name: ::core::stringify!($field),
                                    rename: $crate::__field_rename!($($rename)?),
                                    markers: &[$(::core::stringify!($marker)),*],
                                    shape: || <$fty as $crate::Mappable>::SHAPE,
                                    project: |instance| {
                                        instance
                                            .downcast_mut::<$ty>()
                                            .map(|instance| &mut instance.$field as &mut dyn ::core::any::Any)
                                    },
                                }
                            ),*
                        ],
                        clone_into: $clone_into,
                    }),
                    default_value: $crate::boxed_default::<$ty>,
                    reset: $crate::reset_in_place::<$ty>,
                }
            };
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_rename {
    () => {
        ::core::option::Option::None
    };
    ($rename:literal) => {
        ::core::option::Option::Some($rename)
    };
}

/// Implements [`Mappable`](crate::Mappable) for an existing unit enum.
///
/// List the variants in declaration order; records select them by name
/// (ignoring case) or by position. The enum must implement `Default`.
///
/// ```
/// use rowgraph_core::{Def, Mappable, mappable_enum};
///
/// #[derive(Debug, Default, PartialEq)]
/// enum Tier {
///     #[default]
///     Bronze,
///     Silver,
///     Gold,
/// }
///
/// mappable_enum!(Tier { Bronze, Silver, Gold });
///
/// let Def::Enum(def) = Tier::SHAPE.def else { unreachable!() };
/// assert_eq!(def.variant_index("gold"), Some(2));
/// ```
#[macro_export]
macro_rules! mappable_enum {
    ($ty:ident { $($variant:ident),* $(,)? }) => {
        impl $crate::Mappable for $ty {
            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape {
                    id: ::core::any::TypeId::of::<$ty>,
                    type_identifier: ::core::stringify!($ty),
                    def: $crate::Def::Enum($crate::EnumDef {
                        variants: &[$(::core::stringify!($variant)),*],
                        assign: |target, value| {
                            let $crate::Value::Variant(index) = value else {
                                return ::core::result::Result::Err(value);
                            };
                            let ::core::option::Option::Some(target) = target.downcast_mut::<$ty>() else {
                                return ::core::result::Result::Err(value);
                            };
                            match [$($ty::$variant),*].into_iter().nth(index) {
                                ::core::option::Option::Some(variant) => {
                                    *target = variant;
                                    ::core::result::Result::Ok(())
                                }
                                ::core::option::Option::None => ::core::result::Result::Err(value),
                            }
                        },
                    }),
                    default_value: $crate::boxed_default::<$ty>,
                    reset: $crate::reset_in_place::<$ty>,
                }
            };
        }
    };
}
