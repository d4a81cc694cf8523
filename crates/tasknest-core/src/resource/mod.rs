//! Owner-scoped CRUD resources.
//!
//! A [`Resource`] describes how one entity type is listed, fetched, added,
//! edited and deleted inside a transaction. [`ResourceService`] wraps any
//! resource with the shared request flow.

mod category;
mod service;
mod todo_item;
mod todo_task;

pub use category::Categories;
pub use service::ResourceService;
pub use todo_item::TodoItems;
pub use todo_task::TodoTasks;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::dto::Targeted;
use crate::error::Result;
use crate::owner::Owner;
use crate::store::{Store, Transaction};
use crate::validation::Command;

/// Entity-specific behavior plugged into [`ResourceService`].
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Entity name used in messages.
    const KIND: &'static str;

    type Query: Send + Sync;
    type Summary: Send;
    type Detail: Send;
    type Add: Command + Send + Sync;
    type Edit: Command + Targeted + Send + Sync;
    type DeleteOptions: Default + Send + Sync;

    async fn list(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        query: &Self::Query,
    ) -> Result<Vec<Self::Summary>>;

    async fn get(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<Self::Detail>>;

    /// Persist a validated command and return the new guid.
    async fn add(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: Self::Add) -> Result<Uuid>;

    /// Apply a validated command. Returns `false` when no owned row matches.
    async fn edit(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: Self::Edit)
        -> Result<bool>;

    /// Remove a row. Returns `false` when no owned row matches.
    async fn delete(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
        options: &Self::DeleteOptions,
    ) -> Result<bool>;
}

/// The services behind the HTTP API.
#[derive(Clone)]
pub struct Services {
    pub categories: ResourceService<Categories>,
    pub todo_items: ResourceService<TodoItems>,
    pub todo_tasks: ResourceService<TodoTasks>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            categories: ResourceService::new(store.clone(), Categories),
            todo_items: ResourceService::new(store.clone(), TodoItems),
            todo_tasks: ResourceService::new(store, TodoTasks),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::Services;
    use crate::dto::{AddCategoryCmd, AddTodoItemCmd, AddTodoTaskCmd};
    use crate::store::MemoryStore;

    pub fn services() -> Services {
        Services::new(Arc::new(MemoryStore::new()))
    }

    pub fn category(name: &str) -> AddCategoryCmd {
        AddCategoryCmd {
            name: name.into(),
            description: "desc".into(),
            is_visible: true,
            priority: "High".into(),
        }
    }

    pub fn item(title: &str, category_guid: Uuid) -> AddTodoItemCmd {
        AddTodoItemCmd {
            title: title.into(),
            description: "details".into(),
            category_guid,
            due_date: Some(Utc::now() + Duration::days(1)),
        }
    }

    pub fn task(title: &str, todo_item_guid: Uuid) -> AddTodoTaskCmd {
        AddTodoTaskCmd {
            todo_item_guid,
            title: title.into(),
            is_completed: false,
            due_date: None,
        }
    }
}
