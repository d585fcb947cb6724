//! Record and entity contracts.
//!
//! The core never owns application data. It only requires that records
//! expose a persisted predicate (via [`Record::record_id`]) and that the
//! types acting as agents or targets carry enough static metadata
//! ([`Entity`]) to register themselves and derive relation schemas.

use std::any::{Any, TypeId};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single, simple record identifier.
///
/// Identity is defined by the host storage system; the core only requires
/// that it is a single column. Composite identifiers are unsupported.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
pub enum RecordId {
    #[display("{_0}")]
    Int(i64),
    #[display("{_0}")]
    Text(String),
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

/// An application record that can act in an authorization check.
///
/// Object-safe on purpose: loaders hand records to the pipeline as
/// `Arc<dyn Record>`, and the manager dispatches on the runtime type.
pub trait Record: Any + fmt::Debug + Send + Sync {
    /// Stable identifier, or `None` while the record is unsaved.
    fn record_id(&self) -> Option<RecordId>;

    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runtime type of a record, as used for registry lookups.
pub(crate) fn runtime_type_id(record: &dyn Record) -> TypeId {
    let any: &dyn Any = record;
    any.type_id()
}

/// Downcast a record to a concrete entity type.
pub fn downcast_record<E: Entity>(record: &dyn Record) -> Option<&E> {
    let any: &dyn Any = record;
    any.downcast_ref::<E>()
}

/// Static metadata for a type that registers as an agent or target.
pub trait Entity: Record + Sized {
    /// Type name, e.g. `User`. Feeds schema names.
    const NAME: &'static str;

    /// Backend-level name, e.g. `user`. Feeds storage and back-reference names.
    const STORAGE_NAME: &'static str;

    /// Primary key columns. The shipped schema factory rejects anything
    /// but a single column.
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
}

/// Registered descriptor for an agent or target type.
///
/// Captures the [`Entity`] metadata together with the `TypeId` the registry
/// keys its schema map by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    type_id: TypeId,
    name: &'static str,
    storage_name: &'static str,
    primary_key: &'static [&'static str],
}

impl EntityType {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            name: E::NAME,
            storage_name: E::STORAGE_NAME,
            primary_key: E::PRIMARY_KEY,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn storage_name(&self) -> &'static str {
        self.storage_name
    }

    pub fn primary_key(&self) -> &'static [&'static str] {
        self.primary_key
    }
}

impl std::hash::Hash for EntityType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

/// Serializable reference to an entity type, embedded in declarative schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub storage_name: String,
}

impl From<&EntityType> for EntityRef {
    fn from(entity: &EntityType) -> Self {
        Self {
            name: entity.name.to_string(),
            storage_name: entity.storage_name.to_string(),
        }
    }
}
