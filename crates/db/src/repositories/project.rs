//! Project repository for database operations.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::debug;

use crate::entities::projects;
use vitrine_core::delivery::{
    DeliveryError, ProjectAttachments, ProjectRepository as ProjectRepoTrait,
};

/// Project repository implementation.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Create a new project repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a project row by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<projects::Model>, sea_orm::DbErr> {
        projects::Entity::find_by_id(id).one(self.db.as_ref()).await
    }
}

impl ProjectRepoTrait for ProjectRepository {
    async fn find_attachments(
        &self,
        project_id: i32,
    ) -> Result<Option<ProjectAttachments>, DeliveryError> {
        let project = self
            .find_by_id(project_id)
            .await
            .map_err(|e| DeliveryError::repository(e.to_string()))?;

        debug!(project_id, found = project.is_some(), "Loaded project");
        Ok(project.map(to_domain))
    }
}

fn to_domain(model: projects::Model) -> ProjectAttachments {
    ProjectAttachments {
        id: model.id,
        title: model.title,
        attachments: model.attachments.unwrap_or_default(),
    }
}
