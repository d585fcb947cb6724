//! Declarative permission relation schemas and the factory contract.
//!
//! One schema exists per (agent-type, target-type) pair. A schema is plain
//! data: it names the join relation and its storage location, and a storage
//! layer consumes it to create whatever physical structure it needs. No
//! runtime type synthesis happens here.

use serde::{Deserialize, Serialize};

use crate::errors::{PermbaseError, PermbaseResult};
use crate::record::{EntityRef, EntityType, RecordId};

/// One grant row: a persisted fact that `agent_id` holds `permission`
/// on `target_id` under some schema.
///
/// The (agent, target, permission) triple is unique per schema; enforcing
/// that uniqueness belongs to the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Grant {
    pub agent_id: RecordId,
    pub target_id: RecordId,
    pub permission: String,
}

/// Back-reference collection names a storage layer may expose on the
/// parent types for bidirectional navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackRefs {
    /// Collection name on the agent type: `targets_{target_storage}`.
    pub on_agent: String,
    /// Collection name on the target type: `agents_{agent_storage}`.
    pub on_target: String,
}

/// Declarative description of the join relation for one type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSchema {
    name: String,
    storage_name: String,
    agent: EntityRef,
    target: EntityRef,
    back_refs: Option<BackRefs>,
}

impl PermissionSchema {
    /// Columns of every permission relation, in storage order.
    pub const COLUMNS: [&'static str; 4] = ["id", "agent_id", "target_id", "permission"];

    /// Columns covered by the uniqueness constraint.
    pub const UNIQUE_COLUMNS: [&'static str; 3] = ["agent_id", "target_id", "permission"];

    pub fn new(agent: &EntityType, target: &EntityType) -> Self {
        Self {
            name: schema_name(agent, target),
            storage_name: storage_name(agent, target),
            agent: agent.into(),
            target: target.into(),
            back_refs: None,
        }
    }

    /// Schema name: `{AgentName}{TargetName}Permission`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage name: `{agent_storage}_{target_storage}_permission`.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    pub fn agent(&self) -> &EntityRef {
        &self.agent
    }

    pub fn target(&self) -> &EntityRef {
        &self.target
    }

    pub fn back_refs(&self) -> Option<&BackRefs> {
        self.back_refs.as_ref()
    }

    pub(crate) fn set_back_refs(&mut self, back_refs: BackRefs) {
        self.back_refs = Some(back_refs);
    }
}

/// `{AgentName}{TargetName}Permission`
pub fn schema_name(agent: &EntityType, target: &EntityType) -> String {
    format!("{}{}Permission", agent.name(), target.name())
}

/// `{agent_storage}_{target_storage}_permission`
pub fn storage_name(agent: &EntityType, target: &EntityType) -> String {
    format!(
        "{}_{}_permission",
        agent.storage_name(),
        target.storage_name()
    )
}

/// Back-reference names for a pair.
pub fn back_ref_names(agent: &EntityType, target: &EntityType) -> BackRefs {
    BackRefs {
        on_agent: format!("targets_{}", target.storage_name()),
        on_target: format!("agents_{}", agent.storage_name()),
    }
}

/// Derives the join relation for an agent/target type pair.
///
/// `create` must be deterministic and pure with respect to naming: the
/// registry runs it once per pair and is free to order pairs arbitrarily.
pub trait SchemaFactory {
    fn create(&self, agent: &EntityType, target: &EntityType) -> PermbaseResult<PermissionSchema>;

    /// Back-reference names the parent types should expose, for storage
    /// models that need bidirectional navigation. Runs exactly once per
    /// pair, after `create` and before the schema is registered.
    fn link_parents(&self, agent: &EntityType, target: &EntityType) -> Option<BackRefs> {
        let _ = (agent, target);
        None
    }
}

/// Standard factory for stores with single-column primary keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationSchemaFactory {
    bidirectional: bool,
}

impl RelationSchemaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit back-reference names for every pair.
    pub fn with_back_refs(mut self) -> Self {
        self.bidirectional = true;
        self
    }
}

impl SchemaFactory for RelationSchemaFactory {
    fn create(&self, agent: &EntityType, target: &EntityType) -> PermbaseResult<PermissionSchema> {
        ensure_simple_key(agent)?;
        ensure_simple_key(target)?;
        Ok(PermissionSchema::new(agent, target))
    }

    fn link_parents(&self, agent: &EntityType, target: &EntityType) -> Option<BackRefs> {
        self.bidirectional.then(|| back_ref_names(agent, target))
    }
}

fn ensure_simple_key(entity: &EntityType) -> PermbaseResult<()> {
    if entity.primary_key().len() == 1 {
        Ok(())
    } else {
        Err(PermbaseError::SchemaConfig(format!(
            "composite primary key on {} is not supported",
            entity.name()
        )))
    }
}
