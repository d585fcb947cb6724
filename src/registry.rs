//! Type registry: which types act as agents, which act as targets, and
//! which permission schema links each pair.
//!
//! A registry is built once at startup: register every agent and target
//! type, then run one [`Registry::make_schemas`] pass. After that it is
//! read-only; share it via `Arc`. Tests construct their own instances
//! instead of mutating shared state.

use std::any::TypeId;
use std::collections::HashMap;

use log::debug;

use crate::errors::{PermbaseError, PermbaseResult};
use crate::record::{Entity, EntityType, Record, runtime_type_id};
use crate::schema::{PermissionSchema, SchemaFactory};

#[derive(Debug, Default)]
pub struct Registry {
    agents: HashMap<TypeId, EntityType>,
    targets: HashMap<TypeId, EntityType>,
    schemas: HashMap<(TypeId, TypeId), PermissionSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently mark a type as a valid agent; returns its descriptor.
    pub fn register_agent<A: Entity>(&mut self) -> EntityType {
        let entity = EntityType::of::<A>();
        debug!("registered agent type {}", entity.name());
        self.agents.insert(entity.type_id(), entity.clone());
        entity
    }

    /// Idempotently mark a type as a valid target; returns its descriptor.
    pub fn register_target<T: Entity>(&mut self) -> EntityType {
        let entity = EntityType::of::<T>();
        debug!("registered target type {}", entity.name());
        self.targets.insert(entity.type_id(), entity.clone());
        entity
    }

    pub fn agents(&self) -> impl Iterator<Item = &EntityType> {
        self.agents.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &EntityType> {
        self.targets.values()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &PermissionSchema> {
        self.schemas.values()
    }

    /// Record the schema for a pair. Overwrites silently if called twice;
    /// not expected in normal use.
    pub fn add_permission_schema(
        &mut self,
        agent: &EntityType,
        target: &EntityType,
        schema: PermissionSchema,
    ) {
        self.schemas
            .insert((agent.type_id(), target.type_id()), schema);
    }

    /// Schema registered for a pair of descriptors.
    pub fn permission_schema(
        &self,
        agent: &EntityType,
        target: &EntityType,
    ) -> PermbaseResult<&PermissionSchema> {
        self.schemas
            .get(&(agent.type_id(), target.type_id()))
            .ok_or_else(|| PermbaseError::SchemaNotFound {
                agent: agent.name().to_string(),
                target: target.name().to_string(),
            })
    }

    /// Schema for the runtime types of two records.
    ///
    /// Fails with `SchemaNotFound` when the pair was never processed by
    /// [`Registry::make_schemas`] — including the case where a record's
    /// runtime type differs from the registered type.
    pub fn schema_for(
        &self,
        agent: &dyn Record,
        target: &dyn Record,
    ) -> PermbaseResult<&PermissionSchema> {
        let key = (runtime_type_id(agent), runtime_type_id(target));
        self.schemas
            .get(&key)
            .ok_or_else(|| PermbaseError::SchemaNotFound {
                agent: self.display_name(key.0, agent),
                target: self.display_name(key.1, target),
            })
    }

    fn display_name(&self, type_id: TypeId, record: &dyn Record) -> String {
        self.agents
            .get(&type_id)
            .or_else(|| self.targets.get(&type_id))
            .map(|entity| entity.name().to_string())
            .unwrap_or_else(|| record.type_name().to_string())
    }

    /// Run the factory over every registered agent × target pair and
    /// register the result. Order across pairs is unspecified.
    pub fn make_schemas(&mut self, factory: &dyn SchemaFactory) -> PermbaseResult<()> {
        let agents: Vec<EntityType> = self.agents.values().cloned().collect();
        let targets: Vec<EntityType> = self.targets.values().cloned().collect();
        for agent in &agents {
            for target in &targets {
                let mut schema = factory.create(agent, target)?;
                if let Some(back_refs) = factory.link_parents(agent, target) {
                    schema.set_back_refs(back_refs);
                }
                debug!(
                    "created permission schema {} ({} -> {})",
                    schema.name(),
                    agent.name(),
                    target.name()
                );
                self.add_permission_schema(agent, target, schema);
            }
        }
        Ok(())
    }
}
