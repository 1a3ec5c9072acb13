//! Runtime configuration: naming conventions, explicit identifiers and type
//! converters.

use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;
use std::collections::HashMap;

use rowgraph_core::{Mappable, Shape};

use crate::{TypeConverter, TypeConverterChain};

/// Derives a candidate identifier member name from a type.
pub type NamingConvention = Arc<dyn Fn(&Shape) -> String + Send + Sync>;

/// Settings that drive identifier discovery and value conversion.
///
/// Naming conventions are tried in registration order and the first one
/// naming an existing member wins. When none are registered, `Id` and then
/// `{TypeName}Id` are tried.
#[derive(Clone)]
pub struct Configuration {
    conventions: Vec<NamingConvention>,
    identifiers: HashMap<TypeId, Vec<String>>,
    converters: TypeConverterChain,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            conventions: Vec::new(),
            identifiers: HashMap::new(),
            converters: TypeConverterChain::with_defaults(),
        }
    }
}

impl Configuration {
    /// Default configuration: built-in conventions and converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a naming convention, tried after those already registered.
    pub fn add_convention<F>(&mut self, convention: F) -> &mut Self
    where
        F: Fn(&Shape) -> String + Send + Sync + 'static,
    {
        self.conventions.push(Arc::new(convention));
        self
    }

    /// Builder-style [`Configuration::add_convention`].
    pub fn with_convention<F>(mut self, convention: F) -> Self
    where
        F: Fn(&Shape) -> String + Send + Sync + 'static,
    {
        self.add_convention(convention);
        self
    }

    /// Removes every registered convention, restoring the built-in ones.
    pub fn clear_conventions(&mut self) -> &mut Self {
        self.conventions.clear();
        self
    }

    /// Candidate identifier names for `shape`, one per convention, in the
    /// order they are tried.
    pub fn identifier_candidates(&self, shape: &Shape) -> Vec<String> {
        if self.conventions.is_empty() {
            return vec!["Id".to_owned(), format!("{}Id", shape.type_identifier)];
        }
        self.conventions
            .iter()
            .map(|convention| convention(shape))
            .collect()
    }

    /// Marks member `member` of `T` as an identifier.
    ///
    /// Explicit identifiers replace convention-based discovery for `T`.
    pub fn add_identifier<T: Mappable>(&mut self, member: impl Into<String>) -> &mut Self {
        self.identifiers
            .entry(TypeId::of::<T>())
            .or_default()
            .push(member.into());
        self
    }

    /// Builder-style [`Configuration::add_identifier`].
    pub fn with_identifier<T: Mappable>(mut self, member: impl Into<String>) -> Self {
        self.add_identifier::<T>(member);
        self
    }

    /// Member names registered as identifiers for the type.
    pub fn explicit_identifiers(&self, type_id: TypeId) -> &[String] {
        self.identifiers
            .get(&type_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Adds a type converter to the chain.
    pub fn add_converter(&mut self, converter: impl TypeConverter + 'static) -> &mut Self {
        self.converters.register(converter);
        self
    }

    /// Builder-style [`Configuration::add_converter`].
    pub fn with_converter(mut self, converter: impl TypeConverter + 'static) -> Self {
        self.add_converter(converter);
        self
    }

    /// The converter chain.
    pub fn converters(&self) -> &TypeConverterChain {
        &self.converters
    }

    /// Mutable access to the converter chain, e.g. to clear it.
    pub fn converters_mut(&mut self) -> &mut TypeConverterChain {
        &mut self.converters
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("conventions", &self.conventions.len())
            .field("identifiers", &self.identifiers.len())
            .field("converters", &self.converters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Invoice;

    rowgraph_core::mappable!(Invoice {});

    #[test]
    fn built_in_conventions_apply_until_one_is_registered() {
        let mut config = Configuration::new();
        assert_eq!(
            config.identifier_candidates(Invoice::SHAPE),
            ["Id", "InvoiceId"]
        );

        config.add_convention(|shape| format!("{}Key", shape.type_identifier));
        assert_eq!(config.identifier_candidates(Invoice::SHAPE), ["InvoiceKey"]);

        config.clear_conventions();
        assert_eq!(config.identifier_candidates(Invoice::SHAPE).len(), 2);
    }

    #[test]
    fn explicit_identifiers_are_per_type() {
        let config = Configuration::new()
            .with_identifier::<Invoice>("Number")
            .with_identifier::<Invoice>("Series");
        assert_eq!(
            config.explicit_identifiers(TypeId::of::<Invoice>()),
            ["Number", "Series"]
        );
        assert!(config.explicit_identifiers(TypeId::of::<u32>()).is_empty());
    }

    #[test]
    fn default_converters_are_registered() {
        let config = Configuration::default();
        assert_eq!(config.converters().len(), 3);
    }
}
