#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

#[macro_use]
mod tracing_macros;

mod build;

mod cache;
pub use cache::InstanceCache;
pub(crate) use cache::RootSlot;

mod config;
pub use config::*;

mod convert;
pub use convert::*;

mod error;
pub use error::*;

mod introspect;
pub use introspect::*;

mod mapper;
pub use mapper::*;

mod record;
pub use record::{FlatRecord, NAMESPACE_SEPARATOR};

mod resolve;
pub use resolve::*;

mod scope;
pub use scope::*;

pub use rowgraph_core::{
    Mappable, ScalarType, Shape, Value, ValueKind, mappable, mappable_enum, pascal_case,
};
