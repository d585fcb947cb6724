//! Prelude module for convenient imports.
//!
//! Re-exports the types and traits most applications need:
//!
//! ```rust,ignore
//! use permbase::prelude::*;
//! ```
//!
//! Included: the registry and schema machinery, the manager and backend
//! SPI, loaders, the access-control guard, and the error taxonomy. The
//! in-memory reference backend is re-exported too since tests and examples
//! lean on it. Backend-internal helpers stay out to avoid namespace
//! pollution; import those from their modules when needed.

pub use crate::databases::{MemoryLoader, MemoryStore};
pub use crate::errors::{BackendError, PermbaseError, PermbaseResult};
pub use crate::guard::{AccessControl, DenialCode, Verdict};
pub use crate::loader::{Loader, LoaderConfig, RequestParams};
pub use crate::manager::{CheckScope, PermissionBackend, PermissionManager};
pub use crate::record::{Entity, EntityRef, EntityType, Record, RecordId, downcast_record};
pub use crate::registry::Registry;
pub use crate::schema::{
    BackRefs, Grant, PermissionSchema, RelationSchemaFactory, SchemaFactory,
};
