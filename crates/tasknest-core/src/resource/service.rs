use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::Resource;
use crate::dto::Targeted;
use crate::error::{Result, TaskNestError};
use crate::owner::Owner;
use crate::store::Store;
use crate::validation::Command;

/// Shared request flow for every resource.
///
/// Each call opens one transaction. Writes are committed only when the
/// resource succeeds, so a failed call leaves no partial state behind.
pub struct ResourceService<R> {
    store: Arc<dyn Store>,
    resource: R,
}

impl<R: Clone> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            resource: self.resource.clone(),
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(store: Arc<dyn Store>, resource: R) -> Self {
        Self { store, resource }
    }

    pub async fn list(&self, owner: &Owner, query: &R::Query) -> Result<Vec<R::Summary>> {
        let mut tx = self.store.begin().await?;
        self.resource.list(&mut *tx, owner, query).await
    }

    pub async fn get(&self, owner: &Owner, guid: Uuid) -> Result<R::Detail> {
        let mut tx = self.store.begin().await?;
        self.resource
            .get(&mut *tx, owner, guid)
            .await?
            .ok_or_else(|| TaskNestError::not_found(R::KIND, guid))
    }

    pub async fn add(&self, owner: &Owner, cmd: R::Add) -> Result<Uuid> {
        cmd.validate_at(Utc::now())?;

        let mut tx = self.store.begin().await?;
        let guid = self.resource.add(&mut *tx, owner, cmd).await?;
        tx.commit().await?;

        info!(kind = R::KIND, %owner, %guid, "Added");
        Ok(guid)
    }

    /// Edit the resource at `guid`, which must match the command's guid.
    pub async fn edit(&self, owner: &Owner, guid: Uuid, cmd: R::Edit) -> Result<()> {
        if cmd.guid() != guid {
            return Err(TaskNestError::BadRequest(format!(
                "Route guid {} does not match body guid {}",
                guid,
                cmd.guid()
            )));
        }
        cmd.validate_at(Utc::now())?;

        let mut tx = self.store.begin().await?;
        if !self.resource.edit(&mut *tx, owner, cmd).await? {
            return Err(TaskNestError::not_found(R::KIND, guid));
        }
        tx.commit().await?;

        info!(kind = R::KIND, %owner, %guid, "Edited");
        Ok(())
    }

    /// Delete the resource at `guid`. Deleting an absent resource succeeds.
    pub async fn delete(&self, owner: &Owner, guid: Uuid, options: &R::DeleteOptions) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if self.resource.delete(&mut *tx, owner, guid, options).await? {
            tx.commit().await?;
            info!(kind = R::KIND, %owner, %guid, "Deleted");
        } else {
            debug!(kind = R::KIND, %owner, %guid, "Delete of absent resource");
        }
        Ok(())
    }
}
