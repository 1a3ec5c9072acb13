use std::sync::{Arc, Barrier};

use rowgraph::{
    Configuration, ConvertError, MapErrorKind, Mapper, Shape, TypeConverter, Value, mappable,
    record,
};

#[derive(Debug, Default, PartialEq)]
struct Widget {
    id: i32,
    widget_key: i32,
    name: String,
}

mappable!(Widget { id: i32, widget_key: i32, name: String });

#[test]
fn conventions_registered_at_runtime_apply_to_the_next_call() {
    rowgraph_testhelpers::setup();

    let mapper = Mapper::new();
    let rows = [
        record! { "Id" => 1, "WidgetKey" => 5, "Name" => "a" },
        record! { "Id" => 2, "WidgetKey" => 5, "Name" => "b" },
    ];

    assert_eq!(mapper.describe::<Widget>().identifier_names(), ["Id"]);
    assert_eq!(mapper.map::<Widget, _>(&rows).unwrap().len(), 2);

    mapper.configure(|config| {
        config.add_convention(|shape: &Shape| format!("{}Key", shape.type_identifier));
    });

    assert_eq!(mapper.describe::<Widget>().identifier_names(), ["WidgetKey"]);
    let widgets = mapper.map::<Widget, _>(&rows).unwrap();
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].name, "b");
}

#[test]
fn explicit_identifiers_override_conventions() {
    rowgraph_testhelpers::setup();

    let mapper = Mapper::with_configuration(Configuration::new().with_identifier::<Widget>("Name"));
    assert_eq!(mapper.describe::<Widget>().identifier_names(), ["Name"]);

    let widgets = mapper
        .map::<Widget, _>([
            record! { "Id" => 1, "Name" => "a" },
            record! { "Id" => 2, "Name" => "a" },
        ])
        .unwrap();
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].id, 2);
}

struct YesNo;

impl TypeConverter for YesNo {
    fn order(&self) -> i32 {
        10
    }

    fn can_convert(&self, value: &Value, target: &'static Shape) -> bool {
        target.innermost().is_type::<bool>() && value.as_str().is_some()
    }

    fn convert(&self, value: Value, _target: &'static Shape) -> Result<Value, ConvertError> {
        match value.as_str().map(str::to_ascii_lowercase).as_deref() {
            Some("yes") => Ok(Value::Bool(true)),
            Some("no") => Ok(Value::Bool(false)),
            _ => Err(ConvertError::new(format!("{value} is neither yes nor no"))),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Flag {
    id: i32,
    enabled: bool,
}

mappable!(Flag { id: i32, enabled: bool });

#[test]
fn converters_registered_at_runtime_run_first() {
    rowgraph_testhelpers::setup();

    let mapper = Mapper::new();
    let row = record! { "Id" => 1, "Enabled" => "Yes" };

    let err = mapper.map_one::<Flag>(&row).unwrap_err();
    assert!(matches!(err.kind(), MapErrorKind::Conversion(_)));

    mapper.configure(|config| {
        config.add_converter(YesNo);
    });
    let flag: Flag = mapper.map_one(&row).unwrap();
    assert!(flag.enabled);

    // the first converter that accepts the value decides, even when it fails
    let err = mapper
        .map_one::<Flag>(&record! { "Enabled" => "true" })
        .unwrap_err();
    match err.kind() {
        MapErrorKind::Conversion(failure) => {
            assert_eq!(failure.reason.as_deref(), Some(r#""true" is neither yes nor no"#));
        }
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[test]
fn without_converters_mismatched_values_fail_assignment() {
    rowgraph_testhelpers::setup();

    let mapper = Mapper::new();
    mapper.configure(|config| config.converters_mut().clear());
    assert!(mapper.configuration().converters().is_empty());

    let err = mapper
        .map_one::<Flag>(&record! { "Id" => 1i64 })
        .unwrap_err();
    match err.kind() {
        MapErrorKind::Assignment(failure) => {
            assert_eq!(failure.member, "Id");
            assert_eq!(failure.value, Value::I64(1));
            assert_eq!(failure.declaring_type, "Flag");
        }
        other => panic!("expected an assignment error, got {other:?}"),
    }
}

#[derive(Debug, Default)]
struct Sensor {
    id: u64,
    site: String,
}

mappable!(Sensor { id: u64, site: String });

#[test]
fn concurrent_first_use_shares_one_descriptor() {
    rowgraph_testhelpers::setup();

    let mapper = Arc::new(Mapper::new());
    let barrier = Arc::new(Barrier::new(8));

    let descriptors: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mapper = Arc::clone(&mapper);
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    barrier.wait();
                    mapper.describe::<Sensor>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for descriptor in &descriptors[1..] {
        assert!(Arc::ptr_eq(&descriptors[0], descriptor));
    }
    assert_eq!(mapper.introspector().len(), 1);
}

#[test]
fn one_mapper_serves_many_threads() {
    rowgraph_testhelpers::setup();

    let sensors: Vec<Vec<Sensor>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4u64)
            .map(|n| {
                s.spawn(move || {
                    Mapper::global()
                        .map::<Sensor, _>([
                            record! { "Id" => n, "Site" => "a" },
                            record! { "Id" => n, "Site" => "b" },
                        ])
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (n, batch) in sensors.iter().enumerate() {
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, n as u64);
        assert_eq!(batch[0].site, "b");
    }
}
