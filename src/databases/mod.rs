//! Backend adapters shipped with the crate.
//!
//! Production adapters live in their own crates and only need to satisfy
//! the [`crate::manager::PermissionBackend`] SPI. The in-memory store here
//! is the reference implementation of the contract and the substrate for
//! the integration tests.

pub mod memory;

pub use memory::{MemoryLoader, MemoryStore};
