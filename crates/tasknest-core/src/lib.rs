//! Domain core of the TaskNest todo service.
//!
//! Entities, commands and views, the ownership resolver, the transactional
//! store abstraction with its in-memory backend, and the owner-scoped
//! resource services.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod model;
pub mod owner;
pub mod resource;
pub mod store;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{AuthContext, Claims, ClaimsBuilder};
pub use config::TaskNestConfig;
pub use error::{Result, TaskNestError};
pub use owner::{Owner, OwnerStrategy};
pub use resource::{Resource, ResourceService, Services};
pub use store::{MemoryStore, Store, Transaction};
