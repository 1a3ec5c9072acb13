use alloc::borrow::Cow;
use core::any::Any;

use super::Shape;

/// Projects a struct instance onto one of its fields.
///
/// Returns `None` if `instance` is not of the declaring type.
pub type ProjectFn = fn(instance: &mut dyn Any) -> Option<&mut dyn Any>;

/// Marker that flags a field as identity-bearing.
pub const IDENTIFIER_MARKER: &str = "id";

/// Describes a field in a struct: the member handle the engine works with.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    /// The Rust identifier of the field, e.g. `first_name`.
    pub name: &'static str,

    /// Explicit member name, overriding the derived one.
    pub rename: Option<&'static str>,

    /// Markers attached to the field, e.g. `id`.
    pub markers: &'static [&'static str],

    /// Shape of the declared type.
    ///
    /// The layer of indirection allows for recursive type definitions.
    pub shape: fn() -> &'static Shape,

    /// Mutable access to the field inside an instance.
    pub project: ProjectFn,
}

impl Field {
    /// Returns the shape of the declared type.
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    /// Returns true if the field carries `marker`.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| *m == marker)
    }

    /// Returns true if the field is explicitly marked as an identifier.
    pub fn is_identifier(&self) -> bool {
        self.has_marker(IDENTIFIER_MARKER)
    }

    /// The name records use to address this member.
    ///
    /// This is the explicit rename if present, otherwise the Rust identifier
    /// in PascalCase (`first_name` becomes `FirstName`). Member names never
    /// contain `_`, which records reserve as the namespace separator.
    pub fn member_name(&self) -> Cow<'static, str> {
        match self.rename {
            Some(rename) => Cow::Borrowed(rename),
            None => Cow::Owned(pascal_case(self.name)),
        }
    }
}

/// Converts a snake_case identifier to PascalCase.
///
/// ```
/// assert_eq!(rowgraph_core::pascal_case("order_total"), "OrderTotal");
/// assert_eq!(rowgraph_core::pascal_case("id"), "Id");
/// assert_eq!(rowgraph_core::pascal_case("r#type"), "Type");
/// ```
pub fn pascal_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut out = String::with_capacity(ident.len());
    for word in ident.split('_').filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_drops_separators() {
        assert_eq!(pascal_case("first_name"), "FirstName");
        assert_eq!(pascal_case("customer_id"), "CustomerId");
        assert_eq!(pascal_case("__leading"), "Leading");
        assert_eq!(pascal_case("already"), "Already");
        assert_eq!(pascal_case("orderTotal"), "OrderTotal");
    }
}
