use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A todo item filed under a category.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoItem {
    pub id: i64,
    pub guid: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoItem {
    /// Create an unsaved, open item.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category_id: i64,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            guid: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            category_id,
            is_completed: false,
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
