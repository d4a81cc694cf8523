//! Persistent entities.
//!
//! Integer ids are surrogate keys assigned by the store (`0` means unsaved)
//! and never leave the process. GUIDs are the external identity.

mod category;
mod priority;
mod todo_item;
mod todo_task;
mod user;

pub use category::Category;
pub use priority::{ParsePriorityError, Priority};
pub use todo_item::TodoItem;
pub use todo_task::TodoTask;
pub use user::{Credentials, User};
