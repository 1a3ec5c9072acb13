use alloc::sync::Arc;
use core::borrow::Borrow;
use std::sync::LazyLock;

use parking_lot::{RwLock, RwLockReadGuard};
use rowgraph_core::Mappable;

use crate::build::GraphBuilder;
use crate::record::records_from_json;
use crate::{Configuration, FlatRecord, MapError, MappingScope, TypeDescriptor, TypeIntrospector};

static GLOBAL: LazyLock<Mapper> = LazyLock::new(Mapper::new);

/// Maps flat records onto typed object graphs.
///
/// A mapper owns its [`Configuration`] and the descriptors computed under
/// it. It is `Send + Sync`: share one across threads, and give each unit of
/// work its own [`MappingScope`].
#[derive(Debug, Default)]
pub struct Mapper {
    configuration: RwLock<Configuration>,
    introspector: TypeIntrospector,
}

impl Mapper {
    /// Creates a mapper with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper with the given configuration.
    pub fn with_configuration(configuration: Configuration) -> Self {
        Mapper {
            configuration: RwLock::new(configuration),
            introspector: TypeIntrospector::new(),
        }
    }

    /// The process-wide mapper, created on first use.
    pub fn global() -> &'static Mapper {
        &GLOBAL
    }

    /// Changes the configuration. Takes effect on the next mapping call.
    ///
    /// Every cached descriptor is dropped, since identifiers may have changed.
    pub fn configure<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        let mut configuration = self.configuration.write();
        let result = f(&mut configuration);
        self.introspector.invalidate();
        debug!(?configuration, "reconfigured");
        result
    }

    /// Read access to the current configuration.
    ///
    /// Drop the guard before calling any other method of this mapper.
    pub fn configuration(&self) -> RwLockReadGuard<'_, Configuration> {
        self.configuration.read()
    }

    /// The descriptor of `T` under the current configuration.
    pub fn describe<T: Mappable>(&self) -> Arc<TypeDescriptor> {
        let configuration = self.configuration.read();
        self.introspector.describe(T::SHAPE, &configuration)
    }

    /// The descriptor cache.
    pub fn introspector(&self) -> &TypeIntrospector {
        &self.introspector
    }

    /// Drops every cached descriptor.
    pub fn invalidate_descriptors(&self) {
        self.introspector.invalidate();
    }

    /// Maps records onto instances of `T` in a fresh scope.
    ///
    /// Records sharing an identity merge into one instance. Instances are
    /// returned in the order their first record appeared.
    pub fn map<T, R>(&self, records: impl IntoIterator<Item = R>) -> Result<Vec<T>, MapError>
    where
        T: Mappable,
        R: Borrow<FlatRecord>,
    {
        let mut scope = MappingScope::new();
        self.map_into_scope::<T, R>(&mut scope, records)?;
        Ok(scope.take_roots::<T>())
    }

    /// Maps a single record onto a new instance of `T`.
    pub fn map_one<T: Mappable>(&self, record: &FlatRecord) -> Result<T, MapError> {
        Ok(self
            .map::<T, _>(core::iter::once(record))?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    /// Maps records into `scope`, where identities persist across calls
    /// until the scope is cleared.
    ///
    /// Returns the instances these records touched, in first-touch order.
    pub fn map_in<'s, T, R>(
        &self,
        scope: &'s mut MappingScope,
        records: impl IntoIterator<Item = R>,
    ) -> Result<Vec<&'s T>, MapError>
    where
        T: Mappable,
        R: Borrow<FlatRecord>,
    {
        let slots = self.map_into_scope::<T, R>(scope, records)?;
        let cache = scope.cache();
        Ok(slots
            .into_iter()
            .filter_map(|slot| cache.root::<T>(slot))
            .collect())
    }

    /// Maps a JSON document onto instances of `T` in a fresh scope.
    ///
    /// An object is one record; an array holds records, with `null` elements
    /// skipped. Anything else is a [`MapErrorKind::Shape`](crate::MapErrorKind::Shape)
    /// error.
    pub fn map_json<T: Mappable>(&self, json: serde_json::Value) -> Result<Vec<T>, MapError> {
        self.map::<T, _>(records_from_json(json)?)
    }

    /// [`Mapper::map_json`] into a caller-owned scope.
    pub fn map_json_in<'s, T: Mappable>(
        &self,
        scope: &'s mut MappingScope,
        json: serde_json::Value,
    ) -> Result<Vec<&'s T>, MapError> {
        self.map_in::<T, _>(scope, records_from_json(json)?)
    }

    fn map_into_scope<T, R>(
        &self,
        scope: &mut MappingScope,
        records: impl IntoIterator<Item = R>,
    ) -> Result<Vec<crate::RootSlot>, MapError>
    where
        T: Mappable,
        R: Borrow<FlatRecord>,
    {
        let configuration = self.configuration.read();
        GraphBuilder::new(&self.introspector, &configuration).map_records(
            T::SHAPE,
            records,
            scope.cache_mut(),
        )
    }
}
