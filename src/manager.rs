//! The permission manager and the backend SPI it dispatches to.
//!
//! The manager owns the behavioral contract: every operation first verifies
//! that both records are persisted, then resolves the pair's schema through
//! the registry, and only then calls into the backend adapter. The manager
//! itself never touches storage — [`PermissionBackend`] is the seam that
//! keeps the contract identical across backends.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::errors::{BackendError, PermbaseError, PermbaseResult};
use crate::record::Record;
use crate::registry::Registry;
use crate::schema::{Grant, PermissionSchema};

/// Predicate over candidate grant rows, applied after the scope's
/// equality filters.
pub type RowPredicate = dyn Fn(&Grant) -> bool + Sync;

/// Optional scoping for the two read operations.
///
/// The default scope filters rows by exact agent and target identity.
/// Widening a side matches any row of that side's registered type; the
/// optional `refine` predicate then narrows the candidates. Uniqueness and
/// error semantics are unaffected.
#[derive(Clone, Copy, Default)]
pub struct CheckScope<'a> {
    /// Match rows for any agent of the agent's type.
    pub any_agent: bool,
    /// Match rows for any target of the target's type.
    pub any_target: bool,
    /// Extra row filter applied by the backend after the equality filters.
    pub refine: Option<&'a RowPredicate>,
}

impl<'a> CheckScope<'a> {
    pub fn any_agent() -> Self {
        Self {
            any_agent: true,
            ..Self::default()
        }
    }

    pub fn any_target() -> Self {
        Self {
            any_target: true,
            ..Self::default()
        }
    }

    pub fn refined(refine: &'a RowPredicate) -> Self {
        Self {
            refine: Some(refine),
            ..Self::default()
        }
    }
}

impl fmt::Debug for CheckScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckScope")
            .field("any_agent", &self.any_agent)
            .field("any_target", &self.any_target)
            .field("refine", &self.refine.map(|_| "<predicate>"))
            .finish()
    }
}

/// Storage adapter SPI: the five hooks every backend implements.
///
/// Hooks receive the records and the resolved schema and perform the
/// storage-specific query or mutation. Storage-level failures are reported
/// as [`BackendError`]; the manager translates
/// [`BackendError::UniqueViolation`] into `PermissionExists`. An adapter
/// must roll back its own partial write before returning the violation.
pub trait PermissionBackend: Send + Sync {
    /// Whether a record is persisted. Backends whose storage model has no
    /// concept of an unsaved record should override this to return `true`.
    fn is_saved(&self, record: &dyn Record) -> bool {
        record.record_id().is_some()
    }

    /// All permission labels granted for the pair, under the given scope.
    fn fetch_permissions(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        scope: &CheckScope<'_>,
    ) -> Result<HashSet<String>, BackendError>;

    /// Whether a specific label is granted for the pair, under the given scope.
    fn contains_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        permission: &str,
        scope: &CheckScope<'_>,
    ) -> Result<bool, BackendError>;

    /// Insert a grant row. A duplicate triple must be rejected with
    /// [`BackendError::UniqueViolation`], never silently allowed.
    fn insert_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        permission: &str,
    ) -> Result<Grant, BackendError>;

    /// Delete the grant row. Returns whether a row existed.
    fn delete_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        schema: &PermissionSchema,
        permission: &str,
    ) -> Result<bool, BackendError>;
}

/// The authorization protocol, generic over a storage adapter.
pub struct PermissionManager<B> {
    registry: Arc<Registry>,
    backend: B,
}

impl<B: PermissionBackend> PermissionManager<B> {
    pub fn new(registry: Arc<Registry>, backend: B) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All labels currently granted for this exact (agent, target) pair.
    pub fn get_permissions(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
    ) -> PermbaseResult<HashSet<String>> {
        self.get_permissions_scoped(agent, target, &CheckScope::default())
    }

    /// [`Self::get_permissions`] under a widened or refined scope.
    pub fn get_permissions_scoped(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        scope: &CheckScope<'_>,
    ) -> PermbaseResult<HashSet<String>> {
        let schema = self.resolve_schema(agent, target)?;
        Ok(self
            .backend
            .fetch_permissions(agent, target, schema, scope)?)
    }

    pub fn has_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        permission: &str,
    ) -> PermbaseResult<bool> {
        self.has_permission_scoped(agent, target, permission, &CheckScope::default())
    }

    /// [`Self::has_permission`] under a widened or refined scope.
    pub fn has_permission_scoped(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        permission: &str,
        scope: &CheckScope<'_>,
    ) -> PermbaseResult<bool> {
        let schema = self.resolve_schema(agent, target)?;
        Ok(self
            .backend
            .contains_permission(agent, target, schema, permission, scope)?)
    }

    /// Grant a label for the pair.
    pub fn add_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        permission: &str,
    ) -> PermbaseResult<Grant> {
        let schema = self.resolve_schema(agent, target)?;
        trace!("granting '{}' on {}", permission, schema.storage_name());
        match self
            .backend
            .insert_permission(agent, target, schema, permission)
        {
            Err(BackendError::UniqueViolation(_)) => {
                Err(PermbaseError::PermissionExists(permission.to_string()))
            }
            other => Ok(other?),
        }
    }

    /// Revoke a label for the pair.
    pub fn remove_permission(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
        permission: &str,
    ) -> PermbaseResult<()> {
        let schema = self.resolve_schema(agent, target)?;
        trace!("revoking '{}' on {}", permission, schema.storage_name());
        let removed = self
            .backend
            .delete_permission(agent, target, schema, permission)?;
        if removed {
            Ok(())
        } else {
            Err(PermbaseError::PermissionNotFound(permission.to_string()))
        }
    }

    /// Shared resolution: persisted check on both records, then schema
    /// lookup. The persisted check runs first so an unsaved record is
    /// reported before any schema lookup is attempted.
    fn resolve_schema(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
    ) -> PermbaseResult<&PermissionSchema> {
        self.check_saved(agent)?;
        self.check_saved(target)?;
        self.registry.schema_for(agent, target)
    }

    fn check_saved(&self, record: &dyn Record) -> PermbaseResult<()> {
        if self.backend.is_saved(record) {
            Ok(())
        } else {
            Err(PermbaseError::RecordNotSaved(format!("{record:?}")))
        }
    }
}
