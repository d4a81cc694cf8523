use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ItemFilter, Store, Transaction};
use crate::error::{Result, TaskNestError};
use crate::model::{Category, TodoItem, TodoTask, User};
use crate::owner::Owner;

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    items: BTreeMap<i64, TodoItem>,
    tasks: BTreeMap<i64, TodoTask>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owner_id(&self, owner: &Owner) -> Option<i64> {
        self.users
            .values()
            .find(|u| u.name == owner.name())
            .map(|u| u.id)
    }

    fn owned_category(&self, owner_id: Option<i64>, category_id: i64) -> Option<&Category> {
        self.categories
            .get(&category_id)
            .filter(|c| Some(c.owner_id) == owner_id)
    }

    fn owned_item(&self, owner_id: Option<i64>, item_id: i64) -> Option<(&TodoItem, &Category)> {
        let item = self.items.get(&item_id)?;
        let category = self.owned_category(owner_id, item.category_id)?;
        Some((item, category))
    }

    fn check_category_name(&self, category: &Category) -> Result<()> {
        let taken = self.categories.values().any(|c| {
            c.id != category.id && c.owner_id == category.owner_id && c.name == category.name
        });
        if taken {
            return Err(unique_violation("categories_owner_id_name_key"));
        }
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> TaskNestError {
    TaskNestError::Constraint(format!(
        "duplicate key value violates unique constraint \"{}\"",
        constraint
    ))
}

fn missing_parent(table: &str, constraint: &str) -> TaskNestError {
    TaskNestError::Constraint(format!(
        "insert or update on table \"{}\" violates foreign key constraint \"{}\"",
        table, constraint
    ))
}

fn referenced(table: &str, constraint: &str, child: &str) -> TaskNestError {
    TaskNestError::Constraint(format!(
        "update or delete on table \"{}\" violates foreign key constraint \"{}\" on table \"{}\"",
        table, constraint, child
    ))
}

fn oldest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, i64)) {
    rows.sort_by_key(|row| key(row));
}

/// In-process store used for tests and database-less deployments.
///
/// Mirrors the relational constraints of the PostgreSQL schema. A
/// transaction holds the table lock for its whole lifetime and works on a
/// copy, which replaces the tables on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, work }))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_user(&mut self, name: &str) -> Result<Option<User>> {
        Ok(self.work.users.values().find(|u| u.name == name).cloned())
    }

    async fn insert_user(&mut self, mut user: User) -> Result<User> {
        if self.work.users.values().any(|u| u.name == user.name) {
            return Err(unique_violation("users_name_key"));
        }
        user.id = self.work.next_id();
        self.work.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn ensure_user(&mut self, name: &str) -> Result<(User, bool)> {
        if let Some(user) = self.find_user(name).await? {
            return Ok((user, false));
        }
        let user = self.insert_user(User::new(name)).await?;
        Ok((user, true))
    }

    async fn list_categories(&mut self, owner: &Owner) -> Result<Vec<Category>> {
        let owner_id = self.work.owner_id(owner);
        let mut rows: Vec<Category> = self
            .work
            .categories
            .values()
            .filter(|c| Some(c.owner_id) == owner_id)
            .cloned()
            .collect();
        oldest_first(&mut rows, |c| (c.created_at, c.id));
        Ok(rows)
    }

    async fn find_category(&mut self, owner: &Owner, guid: Uuid) -> Result<Option<Category>> {
        let owner_id = self.work.owner_id(owner);
        Ok(self
            .work
            .categories
            .values()
            .find(|c| c.guid == guid && Some(c.owner_id) == owner_id)
            .cloned())
    }

    async fn insert_category(&mut self, mut category: Category) -> Result<Category> {
        if !self.work.users.contains_key(&category.owner_id) {
            return Err(missing_parent("categories", "categories_owner_id_fkey"));
        }
        self.work.check_category_name(&category)?;
        category.id = self.work.next_id();
        self.work.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        self.work.check_category_name(category)?;
        if let Some(row) = self.work.categories.get_mut(&category.id) {
            *row = category.clone();
        }
        Ok(())
    }

    async fn delete_category(&mut self, id: i64) -> Result<()> {
        if self.work.items.values().any(|i| i.category_id == id) {
            return Err(referenced(
                "categories",
                "todo_items_category_id_fkey",
                "todo_items",
            ));
        }
        self.work.categories.remove(&id);
        Ok(())
    }

    async fn count_items_in_category(&mut self, category_id: i64) -> Result<i64> {
        let count = self
            .work
            .items
            .values()
            .filter(|i| i.category_id == category_id)
            .count();
        Ok(count as i64)
    }

    async fn list_items(
        &mut self,
        owner: &Owner,
        filter: &ItemFilter,
    ) -> Result<Vec<(TodoItem, Category)>> {
        let owner_id = self.work.owner_id(owner);
        let mut rows: Vec<(TodoItem, Category)> = self
            .work
            .items
            .keys()
            .filter_map(|id| self.work.owned_item(owner_id, *id))
            .filter(|(item, category)| filter.matches(item, category))
            .map(|(item, category)| (item.clone(), category.clone()))
            .collect();
        oldest_first(&mut rows, |(i, _)| (i.created_at, i.id));
        Ok(rows)
    }

    async fn find_item(
        &mut self,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<(TodoItem, Category)>> {
        let owner_id = self.work.owner_id(owner);
        let found = self
            .work
            .items
            .values()
            .find(|i| i.guid == guid)
            .and_then(|i| self.work.owned_item(owner_id, i.id))
            .map(|(item, category)| (item.clone(), category.clone()));
        Ok(found)
    }

    async fn insert_item(&mut self, mut item: TodoItem) -> Result<TodoItem> {
        if !self.work.categories.contains_key(&item.category_id) {
            return Err(missing_parent("todo_items", "todo_items_category_id_fkey"));
        }
        item.id = self.work.next_id();
        self.work.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(&mut self, item: &TodoItem) -> Result<()> {
        if !self.work.categories.contains_key(&item.category_id) {
            return Err(missing_parent("todo_items", "todo_items_category_id_fkey"));
        }
        if let Some(row) = self.work.items.get_mut(&item.id) {
            *row = item.clone();
        }
        Ok(())
    }

    async fn delete_item(&mut self, id: i64) -> Result<()> {
        if self.work.tasks.values().any(|t| t.todo_item_id == id) {
            return Err(referenced(
                "todo_items",
                "todo_tasks_todo_item_id_fkey",
                "todo_tasks",
            ));
        }
        self.work.items.remove(&id);
        Ok(())
    }

    async fn list_tasks(&mut self, owner: &Owner) -> Result<Vec<(TodoTask, TodoItem)>> {
        let owner_id = self.work.owner_id(owner);
        let mut rows: Vec<(TodoTask, TodoItem)> = self
            .work
            .tasks
            .values()
            .filter_map(|task| {
                let (item, _) = self.work.owned_item(owner_id, task.todo_item_id)?;
                Some((task.clone(), item.clone()))
            })
            .collect();
        oldest_first(&mut rows, |(t, _)| (t.created_at, t.id));
        Ok(rows)
    }

    async fn find_task(
        &mut self,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<(TodoTask, TodoItem)>> {
        let owner_id = self.work.owner_id(owner);
        let found = self
            .work
            .tasks
            .values()
            .find(|t| t.guid == guid)
            .and_then(|task| {
                let (item, _) = self.work.owned_item(owner_id, task.todo_item_id)?;
                Some((task.clone(), item.clone()))
            });
        Ok(found)
    }

    async fn tasks_of_item(&mut self, item_id: i64) -> Result<Vec<TodoTask>> {
        let mut rows: Vec<TodoTask> = self
            .work
            .tasks
            .values()
            .filter(|t| t.todo_item_id == item_id)
            .cloned()
            .collect();
        oldest_first(&mut rows, |t| (t.created_at, t.id));
        Ok(rows)
    }

    async fn insert_task(&mut self, mut task: TodoTask) -> Result<TodoTask> {
        if !self.work.items.contains_key(&task.todo_item_id) {
            return Err(missing_parent("todo_tasks", "todo_tasks_todo_item_id_fkey"));
        }
        task.id = self.work.next_id();
        self.work.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&mut self, task: &TodoTask) -> Result<()> {
        if let Some(row) = self.work.tasks.get_mut(&task.id) {
            *row = task.clone();
        }
        Ok(())
    }

    async fn delete_task(&mut self, id: i64) -> Result<()> {
        self.work.tasks.remove(&id);
        Ok(())
    }

    async fn delete_tasks_of_item(&mut self, item_id: i64) -> Result<u64> {
        let before = self.work.tasks.len();
        self.work.tasks.retain(|_, t| t.todo_item_id != item_id);
        Ok((before - self.work.tasks.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
