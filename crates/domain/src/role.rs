use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use pillow_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters accepted for a role name.
pub const ROLE_NAME_MAX_LENGTH: usize = 100;

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Administrative change applied to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    /// A role was created.
    Created,
    /// A role's name or description changed.
    Updated,
    /// A role was removed.
    Deleted,
}

impl RoleChange {
    /// Returns the audit action recorded for this change.
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::Created => "ROLE_CREATED",
            Self::Updated => "ROLE_UPDATED",
            Self::Deleted => "ROLE_DELETED",
        }
    }
}

/// Named bundle of permissions assignable to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Role {
    /// Creates a role after validating its name.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: Self::validate_name(name.into())?,
            description: normalize_description(description),
            created_at,
        })
    }

    /// Returns a copy with a new name and/or description.
    pub fn with_changes(
        &self,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        let name = match name {
            Some(name) => Self::validate_name(name)?,
            None => self.name.clone(),
        };
        let description = match description {
            Some(description) => normalize_description(Some(description)),
            None => self.description.clone(),
        };

        Ok(Self {
            id: self.id,
            name,
            description,
            created_at: self.created_at,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns when the role was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn validate_name(name: String) -> AppResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        if trimmed.chars().count() > ROLE_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "role name must not exceed {ROLE_NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(trimmed.to_owned())
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Role, RoleId};

    #[test]
    fn role_name_is_trimmed_and_required() {
        assert!(Role::new(RoleId::new(), "   ", None, Utc::now()).is_err());

        let role = Role::new(RoleId::new(), " auditor ", Some("  ".to_owned()), Utc::now());
        assert!(role.is_ok());
        let Ok(role) = role else {
            return;
        };
        assert_eq!(role.name(), "auditor");
        assert_eq!(role.description(), None);
    }

    #[test]
    fn changes_keep_identity_and_untouched_fields() {
        let Ok(role) = Role::new(
            RoleId::new(),
            "editor",
            Some("Edits content".to_owned()),
            Utc::now(),
        ) else {
            return;
        };

        let changed = role.with_changes(Some("publisher".to_owned()), None);
        let Ok(changed) = changed else {
            return;
        };

        assert_eq!(changed.id(), role.id());
        assert_eq!(changed.name(), "publisher");
        assert_eq!(changed.description(), Some("Edits content"));
        assert_eq!(changed.created_at(), role.created_at());
    }
}
