//! Flat, case-insensitive key/value records.

use indexmap::IndexMap;
use rowgraph_core::Value;

use crate::{MapError, MapErrorKind};

/// Separator between a member name and the keys nested below it.
pub const NAMESPACE_SEPARATOR: char = '_';

/// One row of source data: keys mapped to loosely-typed values.
///
/// Keys compare case-insensitively (`Id`, `id` and `ID` are the same key)
/// and keep their insertion order. A key may address a nested member with
/// `_` separators: `Orders_Id` is member `Id` of collection member `Orders`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatRecord {
    /// lowercase key -> (key as given, value)
    entries: IndexMap<String, (String, Value)>,
}

impl FlatRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any value stored under the same key
    /// (ignoring case). Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        self.entries
            .insert(key.to_lowercase(), (key, value.into()))
            .map(|(_, previous)| previous)
    }

    /// Builder-style [`FlatRecord::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks a key up, ignoring case.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .get(key.to_lowercase().as_str())
            .map(|(_, value)| value)
    }

    /// Returns true if the key is present, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key.to_lowercase().as_str())
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the record has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys (as given) and values, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .values()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Returns true if every value is null (vacuously true when empty).
    pub fn all_null(&self) -> bool {
        self.entries.values().all(|(_, value)| value.is_null())
    }

    /// Collects the keys namespaced under `member` into a new record, with
    /// the `{member}_` prefix stripped.
    ///
    /// The separator is part of the match, so `OrderDetail_Id` does not
    /// belong to member `Order`. Returns `None` when no key matches.
    pub fn namespace(&self, member: &str) -> Option<FlatRecord> {
        let mut prefix = member.to_lowercase();
        prefix.push(NAMESPACE_SEPARATOR);

        let mut nested = FlatRecord::new();
        for (lower, (key, value)) in &self.entries {
            if lower.starts_with(&prefix) {
                // keep the key's own casing when lowercasing preserved its length
                let stripped = key
                    .get(..prefix.len())
                    .filter(|head| head.to_lowercase() == prefix)
                    .and_then(|_| key.get(prefix.len()..))
                    .unwrap_or(&lower[prefix.len()..]);
                nested.insert(stripped, value.clone());
            }
        }
        (!nested.is_empty()).then_some(nested)
    }

    /// Interprets a JSON object as a record.
    ///
    /// Values must be scalars (`null`, booleans, numbers, strings); nested
    /// arrays and objects are a shape error, since records are flat.
    pub fn from_json(value: serde_json::Value) -> Result<FlatRecord, MapError> {
        let serde_json::Value::Object(map) = value else {
            return Err(MapError::new(MapErrorKind::Shape {
                expected: "a key/value record",
                found: json_type(&value).to_owned(),
            }));
        };

        let mut record = FlatRecord::new();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::Bool(b) => Value::Bool(b),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Value::I64(i)
                    } else if let Some(u) = n.as_u64() {
                        Value::U64(u)
                    } else {
                        Value::F64(n.as_f64().unwrap_or(f64::NAN))
                    }
                }
                serde_json::Value::String(s) => Value::String(s),
                other => {
                    return Err(MapError::new(MapErrorKind::Shape {
                        expected: "a flat record",
                        found: format!("{} under key `{key}`", json_type(&other)),
                    }));
                }
            };
            record.insert(key, value);
        }
        Ok(record)
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Splits a JSON document into records: an object is one record, an array
/// holds records (null elements are skipped), anything else is a shape error.
pub(crate) fn records_from_json(input: serde_json::Value) -> Result<Vec<FlatRecord>, MapError> {
    match input {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(FlatRecord::from_json)
            .collect(),
        object @ serde_json::Value::Object(_) => Ok(vec![FlatRecord::from_json(object)?]),
        other => Err(MapError::new(MapErrorKind::Shape {
            expected: "a record or a sequence of records",
            found: json_type(&other).to_owned(),
        })),
    }
}

impl<K, V> FromIterator<(K, V)> for FlatRecord
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FlatRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for FlatRecord
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Builds a [`FlatRecord`] from `key => value` pairs.
///
/// ```
/// use rowgraph::{Value, record};
///
/// let row = record! {
///     "Id" => 1,
///     "FirstName" => "Bob",
///     "Orders_Id" => 10,
///     "Orders_OrderTotal" => 5.0,
///     "Orders_ShippedOn" => Value::Null,
/// };
/// assert_eq!(row.get("id"), Some(&Value::I32(1)));
/// assert!(row.get("orders_shippedon").unwrap().is_null());
/// ```
#[macro_export]
macro_rules! record {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut record = $crate::FlatRecord::new();
        $(
            record.insert($key, $value);
        )*
        record
    }};
}
