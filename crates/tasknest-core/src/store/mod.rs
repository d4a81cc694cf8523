//! Entity persistence.
//!
//! Every service operation runs inside one [`Transaction`]. Dropping a
//! transaction without calling [`Transaction::commit`] discards its writes.
//! Owner-scoped lookups return `None` for rows owned by someone else.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::dto::TodoItemQuery;
use crate::error::Result;
use crate::model::{Category, TodoItem, TodoTask, User};
use crate::owner::Owner;

/// A transactional entity store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Unit of work against a [`Store`].
#[async_trait]
pub trait Transaction: Send {
    async fn find_user(&mut self, name: &str) -> Result<Option<User>>;

    /// Persist a new user and return it with its assigned id.
    async fn insert_user(&mut self, user: User) -> Result<User>;

    /// Fetch the user called `name`, creating a credential-less row if none
    /// exists. The flag is true when this call created the row.
    ///
    /// Concurrent callers for the same name all succeed and observe one row.
    async fn ensure_user(&mut self, name: &str) -> Result<(User, bool)>;

    /// Categories of `owner`, oldest first.
    async fn list_categories(&mut self, owner: &Owner) -> Result<Vec<Category>>;

    async fn find_category(&mut self, owner: &Owner, guid: Uuid) -> Result<Option<Category>>;

    async fn insert_category(&mut self, category: Category) -> Result<Category>;

    async fn update_category(&mut self, category: &Category) -> Result<()>;

    async fn delete_category(&mut self, id: i64) -> Result<()>;

    async fn count_items_in_category(&mut self, category_id: i64) -> Result<i64>;

    /// Items of `owner` with their category, oldest first.
    async fn list_items(
        &mut self,
        owner: &Owner,
        filter: &ItemFilter,
    ) -> Result<Vec<(TodoItem, Category)>>;

    async fn find_item(&mut self, owner: &Owner, guid: Uuid)
        -> Result<Option<(TodoItem, Category)>>;

    async fn insert_item(&mut self, item: TodoItem) -> Result<TodoItem>;

    async fn update_item(&mut self, item: &TodoItem) -> Result<()>;

    async fn delete_item(&mut self, id: i64) -> Result<()>;

    /// Tasks of `owner` with their parent item, oldest first.
    async fn list_tasks(&mut self, owner: &Owner) -> Result<Vec<(TodoTask, TodoItem)>>;

    async fn find_task(&mut self, owner: &Owner, guid: Uuid)
        -> Result<Option<(TodoTask, TodoItem)>>;

    /// Tasks of one item, oldest first.
    async fn tasks_of_item(&mut self, item_id: i64) -> Result<Vec<TodoTask>>;

    async fn insert_task(&mut self, task: TodoTask) -> Result<TodoTask>;

    async fn update_task(&mut self, task: &TodoTask) -> Result<()>;

    async fn delete_task(&mut self, id: i64) -> Result<()>;

    /// Remove every task of an item, returning how many were removed.
    async fn delete_tasks_of_item(&mut self, item_id: i64) -> Result<u64>;

    /// Make all writes durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Filter for listing todo items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Category name, trimmed and lowercased.
    category: Option<String>,
    is_completed: Option<bool>,
}

impl ItemFilter {
    pub fn new(category: Option<&str>, is_completed: Option<bool>) -> Self {
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        Self {
            category,
            is_completed,
        }
    }

    /// Normalized category name to match, if any.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_completed(&self) -> Option<bool> {
        self.is_completed
    }

    /// Whether an item and its category pass the filter.
    pub fn matches(&self, item: &TodoItem, category: &Category) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map(|name| category.name.to_lowercase() == name)
            .unwrap_or(true);
        let completed_ok = self
            .is_completed
            .map(|done| item.is_completed == done)
            .unwrap_or(true);
        category_ok && completed_ok
    }
}

impl From<&TodoItemQuery> for ItemFilter {
    fn from(query: &TodoItemQuery) -> Self {
        Self::new(query.category.as_deref(), query.is_completed)
    }
}
