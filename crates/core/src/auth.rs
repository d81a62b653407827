use serde::{Deserialize, Serialize};

use crate::UserId;

/// Authenticated principal resolved from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    username: String,
}

impl Principal {
    /// Creates a principal from token claims.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    /// Returns the user identifier carried by the token.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the username carried by the token.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }
}
