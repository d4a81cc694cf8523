use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Category, Priority, TodoItem, TodoTask};

/// Body of a 201 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub guid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub guid: Uuid,
    pub name: String,
    pub description: String,
    pub is_visible: bool,
    pub priority: Priority,
    pub owner_name: String,
}

impl CategoryView {
    pub fn new(category: Category, owner_name: &str) -> Self {
        Self {
            guid: category.guid,
            name: category.name,
            description: category.description,
            is_visible: category.is_visible,
            priority: category.priority,
            owner_name: owner_name.to_string(),
        }
    }
}

/// Row of the todo item list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemSummary {
    pub guid: Uuid,
    pub title: String,
    pub description: String,
    pub category_guid: Uuid,
    pub category_name: String,
    pub category_priority: Priority,
    pub category_is_visible: bool,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(TodoItem, Category)> for TodoItemSummary {
    fn from((item, category): (TodoItem, Category)) -> Self {
        Self {
            guid: item.guid,
            title: item.title,
            description: item.description,
            category_guid: category.guid,
            category_name: category.name,
            category_priority: category.priority,
            category_is_visible: category.is_visible,
            is_completed: item.is_completed,
            due_date: item.due_date,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// A todo item with its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemDetail {
    pub guid: Uuid,
    pub title: String,
    pub description: String,
    pub category_guid: Uuid,
    pub category_name: String,
    pub category_priority: Priority,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub todo_tasks: Vec<TodoTaskView>,
}

impl TodoItemDetail {
    pub fn new(item: TodoItem, category: Category, tasks: Vec<TodoTask>) -> Self {
        Self {
            guid: item.guid,
            title: item.title,
            description: item.description,
            category_guid: category.guid,
            category_name: category.name,
            category_priority: category.priority,
            is_completed: item.is_completed,
            due_date: item.due_date,
            created_at: item.created_at,
            updated_at: item.updated_at,
            todo_tasks: tasks.into_iter().map(TodoTaskView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoTaskView {
    pub guid: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TodoTask> for TodoTaskView {
    fn from(task: TodoTask) -> Self {
        Self {
            guid: task.guid,
            title: task.title,
            is_completed: task.is_completed,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// A task annotated with its parent item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoTaskWithItem {
    pub todo_item_guid: Uuid,
    pub todo_item_title: String,
    pub todo_item_is_completed: bool,
    pub todo_item_due_date: Option<DateTime<Utc>>,
    pub guid: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(TodoTask, TodoItem)> for TodoTaskWithItem {
    fn from((task, item): (TodoTask, TodoItem)) -> Self {
        Self {
            todo_item_guid: item.guid,
            todo_item_title: item.title,
            todo_item_is_completed: item.is_completed,
            todo_item_due_date: item.due_date,
            guid: task.guid,
            title: task.title,
            is_completed: task.is_completed,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_never_expose_ids() {
        let mut category = Category::new("Work", "desc", true, Priority::High, 7);
        category.id = 3;
        let mut item = TodoItem::new("Buy milk", "2 litres", 3, None);
        item.id = 11;

        let json = serde_json::to_value(TodoItemSummary::from((item, category.clone()))).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("categoryId").is_none());
        assert_eq!(json["categoryName"], "Work");
        assert_eq!(json["categoryPriority"], "High");
        assert_eq!(json["isCompleted"], false);
        assert!(json["dueDate"].is_null());

        let json = serde_json::to_value(CategoryView::new(category, "alice")).unwrap();
        assert!(json.get("ownerId").is_none());
        assert_eq!(json["ownerName"], "alice");
        assert_eq!(json["isVisible"], true);
    }

    #[test]
    fn test_detail_carries_tasks() {
        let category = Category::new("Home", "chores", false, Priority::Low, 1);
        let item = TodoItem::new("Clean", "kitchen", 1, None);
        let tasks = vec![TodoTask::new(1, "Dishes", false, None)];

        let detail = TodoItemDetail::new(item, category, tasks);
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["todoTasks"][0]["title"], "Dishes");
    }
}
