//! Explicit units of work owning an instance cache.

use core::hash::Hash;
use std::collections::HashMap;

use rowgraph_core::Mappable;

use crate::InstanceCache;

/// One unit of work: records mapped into the same scope share identities.
///
/// Mapping the same identity twice into a scope updates one instance;
/// after [`MappingScope::clear`] the next record builds a fresh one.
/// If a mapping call fails, the scope may hold partially populated
/// instances and should be cleared.
#[derive(Debug, Default)]
pub struct MappingScope {
    cache: InstanceCache,
}

impl MappingScope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every instance built in this scope.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// The scope's instance cache.
    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut InstanceCache {
        &mut self.cache
    }

    /// Number of root instances held.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if the scope holds no instance.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Iterates over the root instances of type `T`, in first-touch order.
    pub fn roots<T: Mappable>(&self) -> impl Iterator<Item = &T> {
        self.cache.roots::<T>()
    }

    /// Moves the root instances of type `T` out of the scope, in first-touch
    /// order.
    pub fn take_roots<T: Mappable>(&mut self) -> Vec<T> {
        self.cache.take_roots::<T>()
    }
}

/// Keyed scope storage: each logical unit of work uses its own key.
#[derive(Debug)]
pub struct ScopeRegistry<K> {
    scopes: HashMap<K, MappingScope>,
}

impl<K> Default for ScopeRegistry<K> {
    fn default() -> Self {
        ScopeRegistry {
            scopes: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> ScopeRegistry<K> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope stored under `key`, if any.
    pub fn get(&self, key: &K) -> Option<&MappingScope> {
        self.scopes.get(key)
    }

    /// Mutable access to the scope stored under `key`, if any.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut MappingScope> {
        self.scopes.get_mut(key)
    }

    /// Stores `scope` under `key`, returning the scope it replaces.
    pub fn store(&mut self, key: K, scope: MappingScope) -> Option<MappingScope> {
        self.scopes.insert(key, scope)
    }

    /// Removes and returns the scope stored under `key`.
    pub fn remove(&mut self, key: &K) -> Option<MappingScope> {
        self.scopes.remove(key)
    }

    /// The scope stored under `key`, created empty on first use.
    pub fn scope(&mut self, key: K) -> &mut MappingScope {
        self.scopes.entry(key).or_default()
    }

    /// Number of stored scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns true if no scope is stored.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
