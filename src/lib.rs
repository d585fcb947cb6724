//! # Permbase
//!
//! A storage-agnostic, object-level authorization library: ask "can AGENT
//! do PERMISSION on TARGET?" without coupling the answer to any particular
//! persistence engine.
//!
//! ## Features
//!
//! - **Backend-Agnostic**: one behavioral contract, enforced identically
//!   across every storage adapter via a five-hook SPI
//! - **Declarative Schemas**: join relations derived per type pair as plain
//!   data, consumed by the storage layer
//! - **Request Guards**: compose loaders, the manager, and an error handler
//!   into a single enforcement step
//! - **Uniform Errors**: duplicate grants, missing grants, unsaved records,
//!   and missing schemas all surface as one error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use permbase::prelude::*;
//!
//! // 1. Describe the types taking part in authorization.
//! #[derive(Debug, Clone)]
//! struct User { id: i64 }
//!
//! impl Record for User {
//!     fn record_id(&self) -> Option<RecordId> { Some(self.id.into()) }
//! }
//! impl Entity for User {
//!     const NAME: &'static str = "User";
//!     const STORAGE_NAME: &'static str = "user";
//! }
//!
//! #[derive(Debug, Clone)]
//! struct Post { id: i64 }
//!
//! impl Record for Post {
//!     fn record_id(&self) -> Option<RecordId> { Some(self.id.into()) }
//! }
//! impl Entity for Post {
//!     const NAME: &'static str = "Post";
//!     const STORAGE_NAME: &'static str = "post";
//! }
//!
//! // 2. Build the registry once at startup.
//! let mut registry = Registry::new();
//! registry.register_agent::<User>();
//! registry.register_target::<Post>();
//! registry.make_schemas(&RelationSchemaFactory::new())?;
//!
//! // 3. Pick a backend and go.
//! let store = MemoryStore::new();
//! let manager = PermissionManager::new(Arc::new(registry), store.clone());
//!
//! let user = User { id: 1 };
//! let post = Post { id: 1 };
//! manager.add_permission(&user, &post, "read")?;
//! assert!(manager.has_permission(&user, &post, "read")?);
//! ```
//!
//! ## Contract
//!
//! Every operation runs the same resolution: verify both records are
//! persisted (`RecordNotSaved`), resolve the pair's schema through the
//! [`registry::Registry`] (`SchemaNotFound`), then dispatch to the backend
//! hook. Grant triples are unique (`PermissionExists` on duplicates,
//! `PermissionNotFound` on revoking an absent grant). The core holds no
//! locks across operations and owns no transactions; races on duplicate
//! grants are rejected by the backend's uniqueness constraint.

pub mod databases;
pub mod errors;
pub mod guard;
pub mod loader;
pub mod manager;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod schema;
