use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use pillow_core::{AppError, AppResult};
use pillow_domain::{Role, RoleId};


/// Repository port for role persistence.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Finds a role by identifier.
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by exact name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Inserts a new role. Duplicate names surface as `AppError::Conflict`.
    async fn insert_role(&self, role: &Role) -> AppResult<()>;

    /// Overwrites an existing role.
    async fn update_role(&self, role: &Role) -> AppResult<()>;

    /// Deletes a role, returning whether a row was removed.
    async fn delete_role(&self, id: RoleId) -> AppResult<bool>;
}

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Input payload for partial role updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New name, if changing.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
}

/// Role state before and after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    /// State before the update.
    pub before: Role,
    /// State after the update.
    pub after: Role,
}

/// Application service for role administration.
#[derive(Clone)]
pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
}

impl RoleService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        Self { repository }
    }

    /// Lists all roles.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Returns one role.
    pub async fn get_role(&self, id: RoleId) -> AppResult<Role> {
        self.repository
            .find_role(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{id}' not found")))
    }

    /// Creates a role with a unique name.
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let role = Role::new(RoleId::new(), input.name, input.description, Utc::now())?;
        self.ensure_name_available(role.name(), None).await?;

        self.repository.insert_role(&role).await?;
        Ok(role)
    }

    /// Applies a partial update and returns both states.
    pub async fn update_role(&self, id: RoleId, input: UpdateRoleInput) -> AppResult<RoleChange> {
        if input.name.is_none() && input.description.is_none() {
            return Err(AppError::Validation(
                "at least one of name or description must be provided".to_owned(),
            ));
        }

        let before = self.get_role(id).await?;
        let after = before.with_changes(input.name, input.description)?;
        if after.name() != before.name() {
            self.ensure_name_available(after.name(), Some(id)).await?;
        }

        self.repository.update_role(&after).await?;
        Ok(RoleChange { before, after })
    }

    /// Deletes a role and returns its last state.
    pub async fn delete_role(&self, id: RoleId) -> AppResult<Role> {
        let role = self.get_role(id).await?;
        if !self.repository.delete_role(id).await? {
            return Err(AppError::NotFound(format!("role '{id}' not found")));
        }

        Ok(role)
    }

    async fn ensure_name_available(&self, name: &str, owner: Option<RoleId>) -> AppResult<()> {
        match self.repository.find_role_by_name(name).await? {
            Some(existing) if Some(existing.id()) != owner => Err(AppError::Conflict(format!(
                "role '{name}' already exists"
            ))),
            _ => Ok(()),
        }
    }
}
