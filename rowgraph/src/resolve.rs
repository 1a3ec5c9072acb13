//! Identity resolution: deciding whether a record describes an entity that
//! has been seen before.

use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU64, Ordering};
use std::hash::DefaultHasher;

use rowgraph_core::Value;

use crate::{FlatRecord, TypeDescriptor};

/// Composite identity of a record: identifier hashes, type and parent,
/// summed with wrapping arithmetic.
pub type Fingerprint = u64;

/// Outcome of identity resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Derived from the record; equal fingerprints mean the same entity.
    Keyed(Fingerprint),
    /// The record carries no identity: always a new instance. The
    /// fingerprint is unique and only scopes the instance's children.
    Fresh(Fingerprint),
}

impl Identity {
    /// The fingerprint, keyed or fresh.
    pub fn fingerprint(self) -> Fingerprint {
        match self {
            Identity::Keyed(fingerprint) | Identity::Fresh(fingerprint) => fingerprint,
        }
    }

    /// Returns true if the instance must not be looked up or reused.
    pub fn is_fresh(self) -> bool {
        matches!(self, Identity::Fresh(_))
    }
}

static NEXT_FRESH: AtomicU64 = AtomicU64::new(1);

fn fresh() -> Identity {
    Identity::Fresh(NEXT_FRESH.fetch_add(1, Ordering::Relaxed))
}

fn hash_of(value: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hashes a record value for identity purposes.
///
/// Numbers hash by numeric value: `1i32`, `1u64` and `1.0f64` collide on
/// purpose, so the same key read at different widths names the same entity.
pub fn hash_value(value: &Value) -> u64 {
    let integral = |f: f64| {
        (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38).then(|| f as i128)
    };

    if let Some(n) = value.as_i128().or_else(|| value.as_f64().and_then(integral)) {
        return hash_of((0u8, n));
    }
    match value {
        Value::Null => 0,
        Value::F32(_) | Value::F64(_) => hash_of((1u8, value.as_f64().map(f64::to_bits))),
        Value::String(s) => hash_of((2u8, s)),
        Value::Char(c) => hash_of((3u8, c)),
        Value::Bool(b) => hash_of((4u8, b)),
        Value::Bytes(bytes) => hash_of((5u8, bytes)),
        Value::Uuid(uuid) => hash_of((6u8, uuid.as_bytes())),
        Value::Variant(index) => hash_of((7u8, index)),
        // integers were handled above
        _ => hash_of((0u8, value.as_i128())),
    }
}

/// Fingerprint scoping the children of nested object member `member`.
pub fn member_scope(parent: Fingerprint, member: &str) -> Fingerprint {
    parent.wrapping_add(hash_of(member.to_lowercase()))
}

/// Resolves the identity of `record` as an instance of the described type,
/// below a parent with fingerprint `parent` (0 for roots).
///
/// Each identifier present with a non-null value adds its hash, the type's
/// hash and `parent`. A zero sum falls back to type and parent alone, which
/// merges every such record under one instance per parent. Types without
/// identifiers, and a fallback that is still zero, get a fresh identity.
pub fn resolve(descriptor: &TypeDescriptor, record: &FlatRecord, parent: Fingerprint) -> Identity {
    if !descriptor.has_identifiers() {
        return fresh();
    }

    let type_hash = hash_of(descriptor.shape().type_id());
    let mut fingerprint: Fingerprint = 0;
    for name in descriptor.identifier_names() {
        if let Some(value) = record.get(name).filter(|value| !value.is_null()) {
            fingerprint = fingerprint
                .wrapping_add(hash_value(value))
                .wrapping_add(type_hash)
                .wrapping_add(parent);
        }
    }

    if fingerprint == 0 {
        fingerprint = type_hash.wrapping_add(parent);
    }
    if fingerprint == 0 {
        return fresh();
    }

    trace!(shape = %descriptor.shape(), fingerprint, parent, "resolved identity");
    Identity::Keyed(fingerprint)
}
