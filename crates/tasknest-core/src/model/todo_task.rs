use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A step belonging to a todo item.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoTask {
    pub id: i64,
    pub guid: Uuid,
    pub todo_item_id: i64,
    pub title: String,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoTask {
    /// Create an unsaved task.
    pub fn new(
        todo_item_id: i64,
        title: impl Into<String>,
        is_completed: bool,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            guid: Uuid::new_v4(),
            todo_item_id,
            title: title.into(),
            is_completed,
            due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as modified.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
