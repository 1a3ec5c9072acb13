use core::any::Any;

use rowgraph_core::{
    CollectionAdapter, Def, Mappable, ScalarType, Shape, Value, mappable, mappable_enum,
};
use uuid::Uuid;

#[derive(Debug, Default, PartialEq)]
enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
}

mappable_enum!(Tier { Bronze, Silver, Gold });

#[derive(Debug, Default, PartialEq)]
struct Line {
    sku: String,
}

mappable!(Line { sku: String });

#[derive(Debug, Default, PartialEq)]
struct Employee {
    employee_id: u32,
    tier: Tier,
    manager: Option<Box<Employee>>,
    lines: Box<[Line]>,
    badge: Option<Uuid>,
}

mappable!(Employee {
    #[id] employee_id: u32,
    tier: Tier,
    manager: Option<Box<Employee>>,
    lines: Box<[Line]> as "Items",
    badge: Option<Uuid>,
});

fn field(shape: &'static Shape, name: &str) -> &'static rowgraph_core::Field {
    shape
        .fields()
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no field {name}"))
}

#[test]
fn scalar_shapes_identify_their_type() {
    rowgraph_testhelpers::setup();

    assert_eq!(u32::SHAPE.scalar_type(), Some(ScalarType::U32));
    assert_eq!(String::SHAPE.scalar_type(), Some(ScalarType::String));
    assert_eq!(Uuid::SHAPE.scalar_type(), Some(ScalarType::Uuid));
    assert!(i64::SHAPE.is_type::<i64>());
    assert!(!i64::SHAPE.is_type::<i32>());
}

#[test]
fn scalar_assign_is_exact() {
    rowgraph_testhelpers::setup();

    let Def::Scalar(def) = i32::SHAPE.def else {
        panic!("i32 is a scalar");
    };
    let mut slot = 0i32;
    (def.assign)(&mut slot, Value::I32(42)).unwrap();
    assert_eq!(slot, 42);

    let rejected = (def.assign)(&mut slot, Value::I64(7)).unwrap_err();
    assert_eq!(rejected, Value::I64(7));
    assert_eq!(slot, 42);

    assert!((i32::SHAPE.reset)(&mut slot));
    assert_eq!(slot, 0);
}

#[test]
fn struct_fields_expose_member_handles() {
    rowgraph_testhelpers::setup();

    let shape = Employee::SHAPE;
    assert_eq!(shape.type_identifier, "Employee");
    assert_eq!(shape.fields().len(), 5);

    let id = field(shape, "employee_id");
    assert!(id.is_identifier());
    assert_eq!(id.member_name(), "EmployeeId");
    assert!(!field(shape, "tier").is_identifier());
    assert_eq!(field(shape, "lines").member_name(), "Items");

    let mut employee = Employee::default();
    let slot = (id.project)(&mut employee).unwrap();
    let Def::Scalar(def) = id.shape().def else {
        panic!("u32 is a scalar");
    };
    (def.assign)(slot, Value::U32(9)).unwrap();
    assert_eq!(employee.employee_id, 9);

    let mut wrong = Line::default();
    assert!((id.project)(&mut wrong).is_none());
}

#[test]
fn recursive_types_resolve_through_thunks() {
    rowgraph_testhelpers::setup();

    let manager = field(Employee::SHAPE, "manager").shape();
    assert_eq!(manager.to_string(), "Option<Box<Employee>>");
    assert_eq!(manager.innermost(), Employee::SHAPE);
    assert_eq!(manager.without_option().to_string(), "Box<Employee>");
}

#[test]
fn option_vtable_inserts_default() {
    rowgraph_testhelpers::setup();

    let Def::Option(def) = <Option<Box<Employee>>>::SHAPE.def else {
        panic!("expected option");
    };
    let mut manager: Option<Box<Employee>> = None;
    assert!(!(def.vtable.is_some)(&manager));

    let inner = (def.vtable.get_or_insert_default)(&mut manager).unwrap();
    assert!(inner.is::<Box<Employee>>());
    assert!((def.vtable.is_some)(&manager));

    assert!((def.vtable.set_none)(&mut manager));
    assert!(manager.is_none());
}

#[test]
fn growable_and_fixed_lists_append() {
    rowgraph_testhelpers::setup();

    let vec_def = <Vec<Line>>::SHAPE.list_def().unwrap();
    assert_eq!(vec_def.adapter, CollectionAdapter::Growable);
    let mut lines: Vec<Line> = Vec::new();
    let item: Box<dyn Any> = Box::new(Line { sku: "A".into() });
    assert_eq!((vec_def.vtable.push)(&mut lines, item).unwrap(), 0);
    assert_eq!((vec_def.vtable.len)(&lines), Some(1));

    let fixed_def = <Box<[Line]>>::SHAPE.list_def().unwrap();
    assert_eq!(fixed_def.adapter, CollectionAdapter::Fixed);
    let mut fixed: Box<[Line]> = Box::default();
    for sku in ["A", "B"] {
        let item: Box<dyn Any> = Box::new(Line { sku: sku.into() });
        (fixed_def.vtable.push)(&mut fixed, item).unwrap();
    }
    assert_eq!(fixed.len(), 2);
    assert_eq!(fixed[1].sku, "B");

    let element = (fixed_def.vtable.get_mut)(&mut fixed, 0).unwrap();
    element.downcast_mut::<Line>().unwrap().sku = "Z".into();
    assert_eq!(fixed[0].sku, "Z");

    let wrong: Box<dyn Any> = Box::new(5u8);
    assert!((fixed_def.vtable.push)(&mut fixed, wrong).is_err());
}

#[test]
fn enum_selects_variant_by_index() {
    rowgraph_testhelpers::setup();

    let Def::Enum(def) = Tier::SHAPE.def else {
        panic!("expected enum");
    };
    assert_eq!(def.variants, &["Bronze", "Silver", "Gold"]);
    assert_eq!(def.variant_index("SILVER"), Some(1));
    assert_eq!(def.variant_index("Platinum"), None);

    let mut tier = Tier::Bronze;
    (def.assign)(&mut tier, Value::Variant(2)).unwrap();
    assert_eq!(tier, Tier::Gold);
    assert!((def.assign)(&mut tier, Value::Variant(3)).is_err());
    assert!((def.assign)(&mut tier, Value::from("Gold")).is_err());
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Folder {
    name: String,
    parent: Option<Box<Folder>>,
}

mappable!(#[clone] Folder {
    name: String,
    parent: Option<Box<Folder>>,
});

#[test]
fn clone_hooks_are_opt_in() {
    rowgraph_testhelpers::setup();

    let Def::Struct(plain) = Line::SHAPE.def else { unreachable!() };
    assert!(plain.clone_into.is_none());

    let Def::Struct(def) = Folder::SHAPE.def else { unreachable!() };
    let clone_into = def.clone_into.unwrap();
    let source = Folder {
        name: "src".to_owned(),
        parent: None,
    };
    let mut target = Folder::default();
    assert!(clone_into(&source, &mut target));
    assert_eq!(target, source);
    assert!(!clone_into(&source, &mut 0u32));
}

#[test]
fn integer_bounds_cover_integers_only() {
    rowgraph_testhelpers::setup();

    assert_eq!(ScalarType::U8.integer_bounds(), Some((0, 255)));
    assert_eq!(ScalarType::I64.integer_bounds(), Some((i64::MIN as i128, i64::MAX as i128)));
    assert_eq!(ScalarType::F32.integer_bounds(), None);
    assert!(ScalarType::U16.is_integer());
    assert!(ScalarType::F64.is_float());
    assert!(!ScalarType::String.is_integer());
}
