use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::Resource;
use crate::dto::{
    AddTodoItemCmd, DeleteTodoItemQuery, EditTodoItemCmd, TodoItemDetail, TodoItemQuery,
    TodoItemSummary,
};
use crate::error::{Result, TaskNestError};
use crate::model::{Category, TodoItem};
use crate::owner::Owner;
use crate::store::{ItemFilter, Transaction};

#[derive(Debug, Clone, Copy, Default)]
pub struct TodoItems;

/// Resolve a category guid supplied in a request body.
async fn owned_category(tx: &mut dyn Transaction, owner: &Owner, guid: Uuid) -> Result<Category> {
    tx.find_category(owner, guid)
        .await?
        .ok_or_else(|| TaskNestError::BadRequest(format!("Category {} not found", guid)))
}

#[async_trait]
impl Resource for TodoItems {
    const KIND: &'static str = "TodoItem";

    type Query = TodoItemQuery;
    type Summary = TodoItemSummary;
    type Detail = TodoItemDetail;
    type Add = AddTodoItemCmd;
    type Edit = EditTodoItemCmd;
    type DeleteOptions = DeleteTodoItemQuery;

    async fn list(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        query: &TodoItemQuery,
    ) -> Result<Vec<TodoItemSummary>> {
        let rows = tx.list_items(owner, &ItemFilter::from(query)).await?;
        Ok(rows.into_iter().map(TodoItemSummary::from).collect())
    }

    async fn get(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<TodoItemDetail>> {
        let Some((item, category)) = tx.find_item(owner, guid).await? else {
            return Ok(None);
        };
        let tasks = tx.tasks_of_item(item.id).await?;
        Ok(Some(TodoItemDetail::new(item, category, tasks)))
    }

    async fn add(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: AddTodoItemCmd) -> Result<Uuid> {
        let category = owned_category(tx, owner, cmd.category_guid).await?;
        let item = tx
            .insert_item(TodoItem::new(
                cmd.title,
                cmd.description,
                category.id,
                cmd.due_date,
            ))
            .await?;
        Ok(item.guid)
    }

    async fn edit(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: EditTodoItemCmd) -> Result<bool> {
        let Some((mut item, _)) = tx.find_item(owner, cmd.guid).await? else {
            return Ok(false);
        };
        let category = owned_category(tx, owner, cmd.category_guid).await?;

        item.title = cmd.title;
        item.description = cmd.description;
        item.category_id = category.id;
        item.is_completed = cmd.is_completed;
        item.due_date = cmd.due_date;
        item.touch();
        tx.update_item(&item).await?;
        Ok(true)
    }

    /// Tasks and item are removed in the same transaction.
    async fn delete(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
        options: &DeleteTodoItemQuery,
    ) -> Result<bool> {
        let Some((item, _)) = tx.find_item(owner, guid).await? else {
            return Ok(false);
        };

        if !tx.tasks_of_item(item.id).await?.is_empty() {
            if !options.delete_tasks {
                return Err(TaskNestError::Integrity("TodoItem has tasks.".into()));
            }
            let removed = tx.delete_tasks_of_item(item.id).await?;
            debug!(%guid, removed, "Removed tasks of todo item");
        }
        tx.delete_item(item.id).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::dto::{DeleteTodoItemQuery, EditTodoItemCmd, TodoItemQuery};
    use crate::error::TaskNestError;
    use crate::owner::Owner;
    use crate::resource::fixtures;
    use crate::validation::field_messages;
    use crate::{assert_err_variant, assert_ok};

    const KEEP_TASKS: DeleteTodoItemQuery = DeleteTodoItemQuery {
        delete_tasks: false,
    };
    const DELETE_TASKS: DeleteTodoItemQuery = DeleteTodoItemQuery { delete_tasks: true };

    #[tokio::test]
    async fn test_work_buy_milk_scenario() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");

        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let mut cmd = fixtures::item("Buy milk", work);
        cmd.due_date = None;
        let milk = services.todo_items.add(&owner, cmd).await.unwrap();

        let query = TodoItemQuery {
            category: Some("Work".into()),
            is_completed: None,
        };
        let listed = services.todo_items.list(&owner, &query).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].guid, milk);
        assert_eq!(listed[0].title, "Buy milk");
        assert_eq!(listed[0].category_guid, work);

        let result = services.categories.delete(&owner, work, &()).await;
        assert_err_variant!(result, TaskNestError::Integrity(_));

        assert_ok!(services.todo_items.delete(&owner, milk, &KEEP_TASKS).await);
        assert_ok!(services.categories.delete(&owner, work, &()).await);
        assert!(services.categories.list(&owner, &()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_past_due_date_rejected() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();

        let mut cmd = fixtures::item("Late", work);
        cmd.due_date = Some(Utc::now() - Duration::minutes(5));

        match services.todo_items.add(&owner, cmd).await {
            Err(TaskNestError::Validation(errors)) => {
                assert!(field_messages(&errors).contains_key("duedate"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let all = services.todo_items.list(&owner, &TodoItemQuery::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_add_with_foreign_category_is_bad_request() {
        let services = fixtures::services();
        let alices = services
            .categories
            .add(&Owner::principal("alice"), fixtures::category("Work"))
            .await
            .unwrap();

        let result = services
            .todo_items
            .add(&Owner::principal("bob"), fixtures::item("Sneaky", alices))
            .await;
        match result {
            Err(TaskNestError::BadRequest(msg)) => {
                assert_eq!(msg, format!("Category {} not found", alices));
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let home = services.categories.add(&owner, fixtures::category("Home")).await.unwrap();

        let report = services.todo_items.add(&owner, fixtures::item("Report", work)).await.unwrap();
        let dishes = services.todo_items.add(&owner, fixtures::item("Dishes", home)).await.unwrap();

        let edit = EditTodoItemCmd {
            guid: dishes,
            title: "Dishes".into(),
            description: "details".into(),
            category_guid: home,
            is_completed: true,
            due_date: None,
        };
        services.todo_items.edit(&owner, dishes, edit).await.unwrap();

        let query = |category: Option<&str>, is_completed: Option<bool>| TodoItemQuery {
            category: category.map(String::from),
            is_completed,
        };
        let guids = |rows: Vec<crate::dto::TodoItemSummary>| -> Vec<Uuid> {
            rows.into_iter().map(|r| r.guid).collect()
        };

        let all = services.todo_items.list(&owner, &query(None, None)).await.unwrap();
        assert_eq!(guids(all), vec![report, dishes]);

        let home_only = services.todo_items.list(&owner, &query(Some("  HOME "), None)).await.unwrap();
        assert_eq!(guids(home_only), vec![dishes]);

        let blank = services.todo_items.list(&owner, &query(Some(""), None)).await.unwrap();
        assert_eq!(blank.len(), 2);

        let open = services.todo_items.list(&owner, &query(None, Some(false))).await.unwrap();
        assert_eq!(guids(open), vec![report]);

        let none = services.todo_items.list(&owner, &query(Some("work"), Some(true))).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_get_includes_tasks() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let item = services.todo_items.add(&owner, fixtures::item("Move", work)).await.unwrap();
        services.todo_tasks.add(&owner, fixtures::task("Pack", item)).await.unwrap();
        services.todo_tasks.add(&owner, fixtures::task("Drive", item)).await.unwrap();

        let detail = services.todo_items.get(&owner, item).await.unwrap();
        let titles: Vec<_> = detail.todo_tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Pack", "Drive"]);
        assert_eq!(detail.category_name, "Work");
        assert!(!detail.is_completed);
    }

    #[tokio::test]
    async fn test_delete_with_tasks_requires_flag() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let item = services.todo_items.add(&owner, fixtures::item("Move", work)).await.unwrap();
        let task = services.todo_tasks.add(&owner, fixtures::task("Pack", item)).await.unwrap();

        match services.todo_items.delete(&owner, item, &KEEP_TASKS).await {
            Err(TaskNestError::Integrity(msg)) => assert_eq!(msg, "TodoItem has tasks."),
            other => panic!("expected integrity error, got {other:?}"),
        }
        assert_ok!(services.todo_items.get(&owner, item).await);
        assert_ok!(services.todo_tasks.get(&owner, task).await);

        assert_ok!(services.todo_items.delete(&owner, item, &DELETE_TASKS).await);
        assert_err_variant!(services.todo_items.get(&owner, item).await, TaskNestError::NotFound(_));
        assert_err_variant!(services.todo_tasks.get(&owner, task).await, TaskNestError::NotFound(_));
        assert!(services.todo_tasks.list(&owner, &()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_rejects_unknown_category() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let item = services.todo_items.add(&owner, fixtures::item("Report", work)).await.unwrap();

        let edit = EditTodoItemCmd {
            guid: item,
            title: "Report".into(),
            description: "details".into(),
            category_guid: Uuid::new_v4(),
            is_completed: false,
            due_date: None,
        };
        let result = services.todo_items.edit(&owner, item, edit).await;
        assert_err_variant!(result, TaskNestError::BadRequest(_));
    }

    #[tokio::test]
    async fn test_edit_refreshes_updated_at_only() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let guid = services.todo_items.add(&owner, fixtures::item("Buy milk", work)).await.unwrap();
        let before = services.todo_items.get(&owner, guid).await.unwrap();
        assert_eq!(before.created_at, before.updated_at);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let edit = EditTodoItemCmd {
            guid,
            title: "Buy oat milk".into(),
            description: "details".into(),
            category_guid: work,
            is_completed: true,
            due_date: before.due_date,
        };
        services.todo_items.edit(&owner, guid, edit).await.unwrap();

        let after = services.todo_items.get(&owner, guid).await.unwrap();
        assert_eq!(after.title, "Buy oat milk");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_edit_missing_item_is_not_found() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let work = services.categories.add(&owner, fixtures::category("Work")).await.unwrap();
        let guid = Uuid::new_v4();

        let edit = EditTodoItemCmd {
            guid,
            title: "Ghost".into(),
            description: "details".into(),
            category_guid: work,
            is_completed: false,
            due_date: None,
        };
        let result = services.todo_items.edit(&owner, guid, edit).await;
        assert_err_variant!(result, TaskNestError::NotFound(_));
    }
}
