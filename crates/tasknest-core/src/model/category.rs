use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Priority;

/// A named bucket of todo items owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub guid: Uuid,
    pub name: String,
    pub description: String,
    pub is_visible: bool,
    pub priority: Priority,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create an unsaved category.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        is_visible: bool,
        priority: Priority,
        owner_id: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            guid: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            is_visible,
            priority,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as modified.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
