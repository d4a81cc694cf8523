use async_trait::async_trait;
use uuid::Uuid;

use super::Resource;
use crate::dto::{AddTodoTaskCmd, EditTodoTaskCmd, TodoTaskWithItem};
use crate::error::{Result, TaskNestError};
use crate::model::TodoTask;
use crate::owner::Owner;
use crate::store::Transaction;

#[derive(Debug, Clone, Copy, Default)]
pub struct TodoTasks;

#[async_trait]
impl Resource for TodoTasks {
    const KIND: &'static str = "TodoTask";

    type Query = ();
    type Summary = TodoTaskWithItem;
    type Detail = TodoTaskWithItem;
    type Add = AddTodoTaskCmd;
    type Edit = EditTodoTaskCmd;
    type DeleteOptions = ();

    async fn list(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        _query: &(),
    ) -> Result<Vec<TodoTaskWithItem>> {
        let rows = tx.list_tasks(owner).await?;
        Ok(rows.into_iter().map(TodoTaskWithItem::from).collect())
    }

    async fn get(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<TodoTaskWithItem>> {
        let row = tx.find_task(owner, guid).await?;
        Ok(row.map(TodoTaskWithItem::from))
    }

    /// The parent item must belong to the caller.
    async fn add(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: AddTodoTaskCmd) -> Result<Uuid> {
        let (item, _) = tx
            .find_item(owner, cmd.todo_item_guid)
            .await?
            .ok_or_else(|| TaskNestError::not_found("TodoItem", cmd.todo_item_guid))?;
        let task = tx
            .insert_task(TodoTask::new(item.id, cmd.title, cmd.is_completed, cmd.due_date))
            .await?;
        Ok(task.guid)
    }

    async fn edit(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: EditTodoTaskCmd) -> Result<bool> {
        let Some((mut task, _)) = tx.find_task(owner, cmd.guid).await? else {
            return Ok(false);
        };
        task.title = cmd.title;
        task.is_completed = cmd.is_completed;
        task.due_date = cmd.due_date;
        task.touch();
        tx.update_task(&task).await?;
        Ok(true)
    }

    async fn delete(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
        _options: &(),
    ) -> Result<bool> {
        let Some((task, _)) = tx.find_task(owner, guid).await? else {
            return Ok(false);
        };
        tx.delete_task(task.id).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::dto::EditTodoTaskCmd;
    use crate::error::TaskNestError;
    use crate::owner::Owner;
    use crate::resource::fixtures;
    use crate::{assert_err_variant, assert_ok};

    async fn item_of(services: &crate::resource::Services, owner: &Owner) -> Uuid {
        let work = services.categories.add(owner, fixtures::category("Work")).await.unwrap();
        services.todo_items.add(owner, fixtures::item("Move", work)).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get_carries_parent() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let item = item_of(&services, &owner).await;

        let mut cmd = fixtures::task("Pack", item);
        cmd.is_completed = true;
        let guid = services.todo_tasks.add(&owner, cmd).await.unwrap();

        let task = services.todo_tasks.get(&owner, guid).await.unwrap();
        assert_eq!(task.title, "Pack");
        assert!(task.is_completed);
        assert_eq!(task.todo_item_guid, item);
        assert_eq!(task.todo_item_title, "Move");
    }

    #[tokio::test]
    async fn test_add_to_foreign_item_is_not_found() {
        let services = fixtures::services();
        let item = item_of(&services, &Owner::principal("alice")).await;

        let result = services
            .todo_tasks
            .add(&Owner::principal("bob"), fixtures::task("Pack", item))
            .await;
        assert_err_variant!(result, TaskNestError::NotFound(_));
    }

    #[tokio::test]
    async fn test_past_due_date_allowed_on_tasks() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let item = item_of(&services, &owner).await;

        let mut cmd = fixtures::task("Overdue", item);
        cmd.due_date = Some(Utc::now() - Duration::days(1));
        assert_ok!(services.todo_tasks.add(&owner, cmd).await);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let services = fixtures::services();
        let alice = Owner::principal("alice");
        let bob = Owner::principal("bob");
        let alices = item_of(&services, &alice).await;
        let bobs = item_of(&services, &bob).await;

        let first = services.todo_tasks.add(&alice, fixtures::task("One", alices)).await.unwrap();
        let second = services.todo_tasks.add(&alice, fixtures::task("Two", alices)).await.unwrap();
        services.todo_tasks.add(&bob, fixtures::task("Theirs", bobs)).await.unwrap();

        let listed: Vec<Uuid> = services
            .todo_tasks
            .list(&alice, &())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.guid)
            .collect();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let services = fixtures::services();
        let owner = Owner::guest("guest");
        let item = item_of(&services, &owner).await;
        let guid = services.todo_tasks.add(&owner, fixtures::task("Pack", item)).await.unwrap();
        let before = services.todo_tasks.get(&owner, guid).await.unwrap();
        assert_eq!(before.created_at, before.updated_at);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let cmd = EditTodoTaskCmd {
            guid,
            title: "Pack boxes".into(),
            is_completed: true,
            due_date: None,
        };
        services.todo_tasks.edit(&owner, guid, cmd).await.unwrap();
        let task = services.todo_tasks.get(&owner, guid).await.unwrap();
        assert_eq!(task.title, "Pack boxes");
        assert!(task.is_completed);
        assert_eq!(task.created_at, before.created_at);
        assert!(task.updated_at > before.updated_at);

        assert_ok!(services.todo_tasks.delete(&owner, guid, &()).await);
        assert_ok!(services.todo_tasks.delete(&owner, guid, &()).await);
        assert_err_variant!(services.todo_tasks.get(&owner, guid).await, TaskNestError::NotFound(_));
    }

    #[tokio::test]
    async fn test_edit_foreign_task_is_not_found() {
        let services = fixtures::services();
        let alice = Owner::principal("alice");
        let item = item_of(&services, &alice).await;
        let guid = services.todo_tasks.add(&alice, fixtures::task("Pack", item)).await.unwrap();

        let cmd = EditTodoTaskCmd {
            guid,
            title: "Mine now".into(),
            is_completed: false,
            due_date: None,
        };
        let result = services.todo_tasks.edit(&Owner::principal("bob"), guid, cmd).await;
        assert_err_variant!(result, TaskNestError::NotFound(_));
    }
}
