//! In-memory reference backend.
//!
//! `MemoryStore` keeps records and grant tables behind an `Arc<RwLock<_>>`
//! and implements the full backend SPI: triple uniqueness on insert, and
//! cascade deletion of grant rows when a referenced record is removed.
//! Useful for tests and as a template for real adapters.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;

use crate::errors::{BackendError, PermbaseResult};
use crate::loader::{Loader, LoaderConfig, RequestParams};
use crate::manager::{CheckScope, PermissionBackend};
use crate::record::{Entity, Record, RecordId, downcast_record};
use crate::schema::{Grant, PermissionSchema};

struct RecordTable {
    storage_name: &'static str,
    rows: HashMap<RecordId, Arc<dyn Record>>,
}

struct GrantTable {
    agent_storage: String,
    target_storage: String,
    rows: BTreeSet<Grant>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<TypeId, RecordTable>,
    grants: HashMap<String, GrantTable>,
}

/// Shared in-memory store. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, BackendError> {
        self.inner
            .read()
            .map_err(|_| BackendError::LockPoisoned("memory store".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, BackendError> {
        self.inner
            .write()
            .map_err(|_| BackendError::LockPoisoned("memory store".to_string()))
    }

    /// Store a record. The record must already carry an identifier.
    pub fn put<E: Entity>(&self, record: E) -> PermbaseResult<Arc<dyn Record>> {
        let id = record
            .record_id()
            .ok_or_else(|| BackendError::Storage(anyhow!("cannot store a record without an id")))?;
        let mut inner = self.write()?;
        let table = inner
            .records
            .entry(TypeId::of::<E>())
            .or_insert_with(|| RecordTable {
                storage_name: E::STORAGE_NAME,
                rows: HashMap::new(),
            });
        let record: Arc<dyn Record> = Arc::new(record);
        table.rows.insert(id, Arc::clone(&record));
        Ok(record)
    }

    /// Fetch a stored record by id.
    pub fn get<E: Entity>(&self, id: &RecordId) -> PermbaseResult<Option<Arc<dyn Record>>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .get(&TypeId::of::<E>())
            .and_then(|table| table.rows.get(id))
            .map(Arc::clone))
    }

    /// Delete a stored record, cascading every grant row that references
    /// it on either side. Returns whether the record existed.
    pub fn delete<E: Entity>(&self, id: &RecordId) -> PermbaseResult<bool> {
        let mut inner = self.write()?;
        let existed = inner
            .records
            .get_mut(&TypeId::of::<E>())
            .map(|table| table.rows.remove(id).is_some())
            .unwrap_or(false);
        if existed {
            for table in inner.grants.values_mut() {
                table.rows.retain(|grant| {
                    !(table.agent_storage == E::STORAGE_NAME && grant.agent_id == *id
                        || table.target_storage == E::STORAGE_NAME && grant.target_id == *id)
                });
            }
        }
        Ok(existed)
    }

    /// Number of grant rows stored under a schema.
    pub fn grant_count(&self, schema: &PermissionSchema) -> PermbaseResult<usize> {
        let inner = self.read()?;
        Ok(inner
            .grants
            .get(schema.storage_name())
            .map(|table| table.rows.len())
            .unwrap_or(0))
    }

    /// Loader over records of one entity type, matching on `id`.
    pub fn loader<E: Entity>(&self) -> MemoryLoader<E> {
        MemoryLoader {
            store: self.clone(),
            config: LoaderConfig::default(),
            matcher: None,
            _entity: PhantomData,
        }
    }
}

fn require_id(record: &dyn Record) -> Result<RecordId, BackendError> {
    record
        .record_id()
        .ok_or_else(|| BackendError::Storage(anyhow!("record {record:?} has no identifier")))
}

fn scope_matches(
    grant: &Grant,
    agent_id: &RecordId,
    target_id: &RecordId,
    scope: &CheckScope<'_>,
) -> bool {
    (scope.any_agent || grant.agent_id == *agent_id)
        && (scope.any_target || grant.target_id == *target_id)
        && scope.refine.is_none_or(|refine| refine(grant))
}

impl PermissionBackend for MemoryStore {
    fn fetch_permissions(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        scope: &CheckScope<'_>,
    ) -> Result<HashSet<String>, BackendError> {
        let agent_id = require_id(agent)?;
        let target_id = require_id(target)?;
        let inner = self.read()?;
        Ok(inner
            .grants
            .get(schema.storage_name())
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|grant| scope_matches(grant, &agent_id, &target_id, scope))
                    .map(|grant| grant.permission.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn contains_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        permission: &str,
        scope: &CheckScope<'_>,
    ) -> Result<bool, BackendError> {
        let agent_id = require_id(agent)?;
        let target_id = require_id(target)?;
        let inner = self.read()?;
        Ok(inner
            .grants
            .get(schema.storage_name())
            .is_some_and(|table| {
                table.rows.iter().any(|grant| {
                    grant.permission == permission
                        && scope_matches(grant, &agent_id, &target_id, scope)
                })
            }))
    }

    fn insert_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        permission: &str,
    ) -> Result<Grant, BackendError> {
        let grant = Grant {
            agent_id: require_id(agent)?,
            target_id: require_id(target)?,
            permission: permission.to_string(),
        };
        let mut inner = self.write()?;
        let table = inner
            .grants
            .entry(schema.storage_name().to_string())
            .or_insert_with(|| GrantTable {
                agent_storage: schema.agent().storage_name.clone(),
                target_storage: schema.target().storage_name.clone(),
                rows: BTreeSet::new(),
            });
        if !table.rows.insert(grant.clone()) {
            return Err(BackendError::UniqueViolation(format!(
                "duplicate grant row in {}",
                schema.storage_name()
            )));
        }
        Ok(grant)
    }

    fn delete_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        permission: &str,
    ) -> Result<bool, BackendError> {
        let grant = Grant {
            agent_id: require_id(agent)?,
            target_id: require_id(target)?,
            permission: permission.to_string(),
        };
        let mut inner = self.write()?;
        Ok(inner
            .grants
            .get_mut(schema.storage_name())
            .map(|table| table.rows.remove(&grant))
            .unwrap_or(false))
    }
}

/// Loader over one entity type in a [`MemoryStore`].
///
/// Matches on the record id by default; [`MemoryLoader::matching`] installs
/// a custom column matcher for anything else.
pub struct MemoryLoader<E> {
    store: MemoryStore,
    config: LoaderConfig,
    matcher: Option<Arc<dyn Fn(&E, &str) -> bool + Send + Sync>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for MemoryLoader<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            matcher: self.matcher.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> MemoryLoader<E> {
    /// Take the match value from a different request parameter.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.config.param = param.into();
        self
    }

    /// Match on an arbitrary column via a predicate over the record.
    pub fn matching(
        mut self,
        column: impl Into<String>,
        matcher: impl Fn(&E, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.config.column = column.into();
        self.matcher = Some(Arc::new(matcher));
        self
    }
}

fn parse_record_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Int)
        .unwrap_or_else(|_| RecordId::Text(raw.to_string()))
}

impl<E: Entity> Loader for MemoryLoader<E> {
    fn load(&self, params: &RequestParams) -> PermbaseResult<Option<Arc<dyn Record>>> {
        let Some(raw) = params.get(&self.config.param) else {
            return Ok(None);
        };
        match &self.matcher {
            None => self.store.get::<E>(&parse_record_id(raw)),
            Some(matcher) => {
                let inner = self.store.read()?;
                Ok(inner.records.get(&TypeId::of::<E>()).and_then(|table| {
                    table
                        .rows
                        .values()
                        .find(|record| {
                            downcast_record::<E>(record.as_ref())
                                .is_some_and(|entity| matcher(entity, raw))
                        })
                        .map(Arc::clone)
                }))
            }
        }
    }
}
