//! PostgreSQL-backed [`Store`].
//!
//! Joined queries alias every column with a table prefix (`c_`, `i_`, `t_`)
//! so rows can be mapped without positional indexes.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row};
use tasknest_core::error::{Result, TaskNestError};
use tasknest_core::model::{Category, Credentials, Priority, TodoItem, TodoTask, User};
use tasknest_core::store::{ItemFilter, Store, Transaction};
use tasknest_core::Owner;
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "c.id AS c_id, c.guid AS c_guid, c.name AS c_name, \
     c.description AS c_description, c.is_visible AS c_is_visible, c.priority AS c_priority, \
     c.owner_id AS c_owner_id, c.created_at AS c_created_at, c.updated_at AS c_updated_at";

const ITEM_COLUMNS: &str = "i.id AS i_id, i.guid AS i_guid, i.title AS i_title, \
     i.description AS i_description, i.category_id AS i_category_id, \
     i.is_completed AS i_is_completed, i.due_date AS i_due_date, \
     i.created_at AS i_created_at, i.updated_at AS i_updated_at";

const TASK_COLUMNS: &str = "t.id AS t_id, t.guid AS t_guid, t.todo_item_id AS t_todo_item_id, \
     t.title AS t_title, t.is_completed AS t_is_completed, t.due_date AS t_due_date, \
     t.created_at AS t_created_at, t.updated_at AS t_updated_at";

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// An open database transaction. Rolled back by sqlx when dropped uncommitted.
struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let salt: Option<String> = row.try_get("salt")?;
    let hash: Option<String> = row.try_get("pass_hash")?;
    Ok(User {
        id: row.try_get("id")?,
        guid: row.try_get("guid")?,
        name: row.try_get("name")?,
        credentials: salt
            .zip(hash)
            .map(|(salt, hash)| Credentials { salt, hash }),
    })
}

fn category_from_row(row: &PgRow) -> Result<Category> {
    let priority: String = row.try_get("c_priority")?;
    let priority: Priority = priority
        .parse()
        .map_err(|e| TaskNestError::Database(format!("Corrupt category row: {}", e)))?;
    Ok(Category {
        id: row.try_get("c_id")?,
        guid: row.try_get("c_guid")?,
        name: row.try_get("c_name")?,
        description: row.try_get("c_description")?,
        is_visible: row.try_get("c_is_visible")?,
        priority,
        owner_id: row.try_get("c_owner_id")?,
        created_at: row.try_get("c_created_at")?,
        updated_at: row.try_get("c_updated_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<TodoItem> {
    Ok(TodoItem {
        id: row.try_get("i_id")?,
        guid: row.try_get("i_guid")?,
        title: row.try_get("i_title")?,
        description: row.try_get("i_description")?,
        category_id: row.try_get("i_category_id")?,
        is_completed: row.try_get("i_is_completed")?,
        due_date: row.try_get("i_due_date")?,
        created_at: row.try_get("i_created_at")?,
        updated_at: row.try_get("i_updated_at")?,
    })
}

fn task_from_row(row: &PgRow) -> Result<TodoTask> {
    Ok(TodoTask {
        id: row.try_get("t_id")?,
        guid: row.try_get("t_guid")?,
        todo_item_id: row.try_get("t_todo_item_id")?,
        title: row.try_get("t_title")?,
        is_completed: row.try_get("t_is_completed")?,
        due_date: row.try_get("t_due_date")?,
        created_at: row.try_get("t_created_at")?,
        updated_at: row.try_get("t_updated_at")?,
    })
}

fn item_with_category(row: &PgRow) -> Result<(TodoItem, Category)> {
    Ok((item_from_row(row)?, category_from_row(row)?))
}

fn task_with_item(row: &PgRow) -> Result<(TodoTask, TodoItem)> {
    Ok((task_from_row(row)?, item_from_row(row)?))
}

fn owned_categories_sql(condition: &str) -> String {
    format!(
        "SELECT {} FROM categories c JOIN users u ON u.id = c.owner_id \
         WHERE u.name = $1 {} ORDER BY c.created_at, c.id",
        CATEGORY_COLUMNS, condition
    )
}

fn owned_items_sql(condition: &str) -> String {
    format!(
        "SELECT {}, {} FROM todo_items i \
         JOIN categories c ON c.id = i.category_id \
         JOIN users u ON u.id = c.owner_id \
         WHERE u.name = $1 {} ORDER BY i.created_at, i.id",
        ITEM_COLUMNS, CATEGORY_COLUMNS, condition
    )
}

fn owned_tasks_sql(condition: &str) -> String {
    format!(
        "SELECT {}, {} FROM todo_tasks t \
         JOIN todo_items i ON i.id = t.todo_item_id \
         JOIN categories c ON c.id = i.category_id \
         JOIN users u ON u.id = c.owner_id \
         WHERE u.name = $1 {} ORDER BY t.created_at, t.id",
        TASK_COLUMNS, ITEM_COLUMNS, condition
    )
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn find_user(&mut self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, guid, name, salt, pass_hash FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&mut self, mut user: User) -> Result<User> {
        let (salt, hash) = match &user.credentials {
            Some(c) => (Some(c.salt.as_str()), Some(c.hash.as_str())),
            None => (None, None),
        };
        let row = sqlx::query(
            "INSERT INTO users (guid, name, salt, pass_hash) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user.guid)
        .bind(&user.name)
        .bind(salt)
        .bind(hash)
        .fetch_one(&mut *self.tx)
        .await?;
        user.id = row.try_get("id")?;
        Ok(user)
    }

    async fn ensure_user(&mut self, name: &str) -> Result<(User, bool)> {
        // A concurrent insert of the same name blocks here until it settles,
        // then the conflict turns this into a no-op.
        let inserted = sqlx::query(
            "INSERT INTO users (guid, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING id, guid, name, salt, pass_hash",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(row) = inserted {
            return Ok((user_from_row(&row)?, true));
        }
        let user = self.find_user(name).await?.ok_or_else(|| {
            TaskNestError::Internal(format!("User '{}' vanished after conflict", name))
        })?;
        Ok((user, false))
    }

    async fn list_categories(&mut self, owner: &Owner) -> Result<Vec<Category>> {
        let rows = sqlx::query(&owned_categories_sql(""))
            .bind(owner.name())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn find_category(&mut self, owner: &Owner, guid: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query(&owned_categories_sql("AND c.guid = $2"))
            .bind(owner.name())
            .bind(guid)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn insert_category(&mut self, mut category: Category) -> Result<Category> {
        let row = sqlx::query(
            "INSERT INTO categories \
             (guid, name, description, is_visible, priority, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(category.guid)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_visible)
        .bind(category.priority.as_str())
        .bind(category.owner_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        category.id = row.try_get("id")?;
        Ok(category)
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            "UPDATE categories SET name = $2, description = $3, is_visible = $4, \
             priority = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_visible)
        .bind(category.priority.as_str())
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_category(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn count_items_in_category(&mut self, category_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM todo_items WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(count)
    }

    async fn list_items(
        &mut self,
        owner: &Owner,
        filter: &ItemFilter,
    ) -> Result<Vec<(TodoItem, Category)>> {
        let sql = owned_items_sql(
            "AND ($2::text IS NULL OR LOWER(c.name) = $2) \
             AND ($3::bool IS NULL OR i.is_completed = $3)",
        );
        let rows = sqlx::query(&sql)
            .bind(owner.name())
            .bind(filter.category())
            .bind(filter.is_completed())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(item_with_category).collect()
    }

    async fn find_item(
        &mut self,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<(TodoItem, Category)>> {
        let row = sqlx::query(&owned_items_sql("AND i.guid = $2"))
            .bind(owner.name())
            .bind(guid)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(item_with_category).transpose()
    }

    async fn insert_item(&mut self, mut item: TodoItem) -> Result<TodoItem> {
        let row = sqlx::query(
            "INSERT INTO todo_items \
             (guid, title, description, category_id, is_completed, due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(item.guid)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.category_id)
        .bind(item.is_completed)
        .bind(item.due_date)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        item.id = row.try_get("id")?;
        Ok(item)
    }

    async fn update_item(&mut self, item: &TodoItem) -> Result<()> {
        sqlx::query(
            "UPDATE todo_items SET title = $2, description = $3, category_id = $4, \
             is_completed = $5, due_date = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.category_id)
        .bind(item.is_completed)
        .bind(item.due_date)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_item(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM todo_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn list_tasks(&mut self, owner: &Owner) -> Result<Vec<(TodoTask, TodoItem)>> {
        let rows = sqlx::query(&owned_tasks_sql(""))
            .bind(owner.name())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(task_with_item).collect()
    }

    async fn find_task(
        &mut self,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<(TodoTask, TodoItem)>> {
        let row = sqlx::query(&owned_tasks_sql("AND t.guid = $2"))
            .bind(owner.name())
            .bind(guid)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(task_with_item).transpose()
    }

    async fn tasks_of_item(&mut self, item_id: i64) -> Result<Vec<TodoTask>> {
        let sql = format!(
            "SELECT {} FROM todo_tasks t WHERE t.todo_item_id = $1 ORDER BY t.created_at, t.id",
            TASK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(item_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(task_from_row).collect()
    }

    async fn insert_task(&mut self, mut task: TodoTask) -> Result<TodoTask> {
        let row = sqlx::query(
            "INSERT INTO todo_tasks \
             (guid, todo_item_id, title, is_completed, due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(task.guid)
        .bind(task.todo_item_id)
        .bind(&task.title)
        .bind(task.is_completed)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        task.id = row.try_get("id")?;
        Ok(task)
    }

    async fn update_task(&mut self, task: &TodoTask) -> Result<()> {
        sqlx::query(
            "UPDATE todo_tasks SET title = $2, is_completed = $3, due_date = $4, \
             updated_at = $5 WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(task.is_completed)
        .bind(task.due_date)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_task(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM todo_tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_tasks_of_item(&mut self, item_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todo_tasks WHERE todo_item_id = $1")
            .bind(item_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
