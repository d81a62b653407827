use async_trait::async_trait;
use tokio::sync::RwLock;

use pillow_application::RoleRepository;
use pillow_core::{AppError, AppResult};
use pillow_domain::{Role, RoleId};

/// In-memory role repository for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<Vec<Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self.roles.read().await.clone();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .find(|role| role.id() == id)
            .cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .find(|role| role.name() == name)
            .cloned())
    }

    async fn insert_role(&self, role: &Role) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        if roles.iter().any(|existing| existing.name() == role.name()) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        roles.push(role.clone());
        Ok(())
    }

    async fn update_role(&self, role: &Role) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        if roles
            .iter()
            .any(|existing| existing.name() == role.name() && existing.id() != role.id())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        let Some(existing) = roles.iter_mut().find(|existing| existing.id() == role.id()) else {
            return Err(AppError::NotFound(format!("role '{}' not found", role.id())));
        };
        *existing = role.clone();
        Ok(())
    }

    async fn delete_role(&self, id: RoleId) -> AppResult<bool> {
        let mut roles = self.roles.write().await;
        let before = roles.len();
        roles.retain(|role| role.id() != id);
        Ok(roles.len() != before)
    }
}
