use insta::assert_snapshot;
use rowgraph::{Mapper, MappingScope, mappable};
use serde_json::json;

#[derive(Debug, Default, PartialEq)]
struct Order {
    id: i32,
    order_total: f64,
    shipped: bool,
}

#[derive(Debug, Default, PartialEq)]
struct Customer {
    id: i32,
    first_name: String,
    orders: Vec<Order>,
}

mappable!(Order { id: i32, order_total: f64, shipped: bool });
mappable!(Customer { id: i32, first_name: String, orders: Vec<Order> });

#[test]
fn arrays_of_objects_map_like_records() {
    rowgraph_testhelpers::setup();

    let customers: Vec<Customer> = Mapper::new()
        .map_json(json!([
            { "Id": 1, "FirstName": "Bob", "Orders_Id": 10, "Orders_OrderTotal": 5, "Orders_Shipped": true },
            null,
            { "id": 1, "orders_id": 11, "orders_ordertotal": 7.5, "orders_shipped": "false" },
        ]))
        .unwrap();

    assert_eq!(
        customers,
        [Customer {
            id: 1,
            first_name: "Bob".to_owned(),
            orders: vec![
                Order { id: 10, order_total: 5.0, shipped: true },
                Order { id: 11, order_total: 7.5, shipped: false },
            ],
        }]
    );
}

#[test]
fn a_single_object_is_one_record() {
    rowgraph_testhelpers::setup();

    let customers: Vec<Customer> = Mapper::new()
        .map_json(json!({ "Id": 4, "FirstName": "Ann", "Orders_Id": null }))
        .unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].first_name, "Ann");
    assert!(customers[0].orders.is_empty());
}

#[test]
fn empty_input_maps_to_nothing() {
    rowgraph_testhelpers::setup();

    let customers: Vec<Customer> = Mapper::new().map_json(json!([])).unwrap();
    assert!(customers.is_empty());
    let customers: Vec<Customer> = Mapper::new().map_json(json!([null, null])).unwrap();
    assert!(customers.is_empty());
}

#[test]
fn json_accumulates_in_a_scope() {
    rowgraph_testhelpers::setup();

    let mapper = Mapper::new();
    let mut scope = MappingScope::new();
    mapper
        .map_json_in::<Customer>(&mut scope, json!({ "Id": 1, "Orders_Id": 10 }))
        .unwrap();
    let customers: Vec<&Customer> = mapper
        .map_json_in(&mut scope, json!([{ "Id": 1, "Orders_Id": 11 }]))
        .unwrap();
    assert_eq!(customers[0].orders.len(), 2);
}

#[test]
fn input_that_is_not_records_is_a_shape_error() {
    rowgraph_testhelpers::setup();

    let mapper = Mapper::new();
    let err = mapper.map_json::<Customer>(json!("Id=1")).unwrap_err();
    assert_eq!(err.kind().code(), "rowgraph::shape");
    assert_snapshot!(err.to_string(), @"input is not a record or a sequence of records: found a string");

    let err = mapper.map_json::<Customer>(json!([{ "Id": 1 }, 2])).unwrap_err();
    assert_snapshot!(err.to_string(), @"input is not a key/value record: found a number");

    let err = mapper
        .map_json::<Customer>(json!({ "Id": 1, "Orders": { "Id": 10 } }))
        .unwrap_err();
    assert_snapshot!(err.to_string(), @"input is not a flat record: found an object under key `Orders`");
}
