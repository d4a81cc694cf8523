use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::validation::{check_future, check_priority, Command};

/// Commands that target an existing resource by guid.
pub trait Targeted {
    /// Guid carried in the request body.
    fn guid(&self) -> Uuid;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCategoryCmd {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Description must be between 1 and 255 characters."))]
    pub description: String,
    #[serde(default)]
    pub is_visible: bool,
    pub priority: String,
}

impl Command for AddCategoryCmd {
    fn check(&self, _now: DateTime<Utc>, errors: &mut ValidationErrors) {
        check_priority(&self.priority, errors);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditCategoryCmd {
    pub guid: Uuid,
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Description must be between 1 and 255 characters."))]
    pub description: String,
    #[serde(default)]
    pub is_visible: bool,
    pub priority: String,
}

impl Command for EditCategoryCmd {
    fn check(&self, _now: DateTime<Utc>, errors: &mut ValidationErrors) {
        check_priority(&self.priority, errors);
    }
}

impl Targeted for EditCategoryCmd {
    fn guid(&self) -> Uuid {
        self.guid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddTodoItemCmd {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Description must be between 1 and 255 characters."))]
    pub description: String,
    pub category_guid: Uuid,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Command for AddTodoItemCmd {
    fn check(&self, now: DateTime<Utc>, errors: &mut ValidationErrors) {
        check_future(self.due_date, now, errors);
    }
}

/// Edits may keep a due date that has since passed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditTodoItemCmd {
    pub guid: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Description must be between 1 and 255 characters."))]
    pub description: String,
    pub category_guid: Uuid,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Command for EditTodoItemCmd {}

impl Targeted for EditTodoItemCmd {
    fn guid(&self) -> Uuid {
        self.guid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddTodoTaskCmd {
    pub todo_item_guid: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Command for AddTodoTaskCmd {}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditTodoTaskCmd {
    pub guid: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Command for EditTodoTaskCmd {}

impl Targeted for EditTodoTaskCmd {
    fn guid(&self) -> Uuid {
        self.guid
    }
}

/// Query string of the todo item list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Query string of todo item deletion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTodoItemQuery {
    /// Remove the item's tasks along with it.
    #[serde(default)]
    pub delete_tasks: bool,
}
