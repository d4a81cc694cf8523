//! TaskNest: an owner-scoped todo service.
//!
//! Categories hold todo items, todo items hold tasks, and every row belongs
//! to the principal that created it. [`TaskNest`] wires configuration, the
//! store and the HTTP gateway together.

mod runtime;

pub use runtime::{StoreHandle, TaskNest, TaskNestBuilder};
