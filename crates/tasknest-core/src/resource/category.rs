use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::Resource;
use crate::dto::{AddCategoryCmd, CategoryView, EditCategoryCmd};
use crate::error::{Result, TaskNestError};
use crate::model::{Category, Priority, User};
use crate::owner::Owner;
use crate::store::Transaction;

#[derive(Debug, Clone, Copy, Default)]
pub struct Categories;

fn parse_priority(value: &str) -> Result<Priority> {
    value
        .parse()
        .map_err(|e: crate::model::ParsePriorityError| TaskNestError::BadRequest(e.to_string()))
}

/// Find the owner's user row, creating it on first write.
async fn provision_owner(tx: &mut dyn Transaction, owner: &Owner) -> Result<User> {
    let (user, created) = tx.ensure_user(owner.name()).await?;
    if created {
        info!(%owner, guest = owner.is_guest(), "Provisioned owner");
    }
    Ok(user)
}

#[async_trait]
impl Resource for Categories {
    const KIND: &'static str = "Category";

    type Query = ();
    type Summary = CategoryView;
    type Detail = CategoryView;
    type Add = AddCategoryCmd;
    type Edit = EditCategoryCmd;
    type DeleteOptions = ();

    async fn list(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        _query: &(),
    ) -> Result<Vec<CategoryView>> {
        let categories = tx.list_categories(owner).await?;
        Ok(categories
            .into_iter()
            .map(|c| CategoryView::new(c, owner.name()))
            .collect())
    }

    async fn get(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
    ) -> Result<Option<CategoryView>> {
        let category = tx.find_category(owner, guid).await?;
        Ok(category.map(|c| CategoryView::new(c, owner.name())))
    }

    async fn add(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: AddCategoryCmd) -> Result<Uuid> {
        let priority = parse_priority(&cmd.priority)?;
        let user = provision_owner(tx, owner).await?;
        let category = tx
            .insert_category(Category::new(
                cmd.name,
                cmd.description,
                cmd.is_visible,
                priority,
                user.id,
            ))
            .await?;
        Ok(category.guid)
    }

    async fn edit(&self, tx: &mut dyn Transaction, owner: &Owner, cmd: EditCategoryCmd) -> Result<bool> {
        let Some(mut category) = tx.find_category(owner, cmd.guid).await? else {
            return Ok(false);
        };
        category.name = cmd.name;
        category.description = cmd.description;
        category.is_visible = cmd.is_visible;
        category.priority = parse_priority(&cmd.priority)?;
        category.touch();
        tx.update_category(&category).await?;
        Ok(true)
    }

    async fn delete(
        &self,
        tx: &mut dyn Transaction,
        owner: &Owner,
        guid: Uuid,
        _options: &(),
    ) -> Result<bool> {
        let Some(category) = tx.find_category(owner, guid).await? else {
            return Ok(false);
        };
        if tx.count_items_in_category(category.id).await? > 0 {
            return Err(TaskNestError::Integrity("Category has tasks.".into()));
        }
        tx.delete_category(category.id).await?;
        Ok(true)
    }
}
