use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Identity-provider user id; keys the per-user watchlist document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who is acting, as reported by the authentication collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn authenticated(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// The signed-in user, or `NotAuthenticated`
    pub fn user(&self) -> AppResult<&UserId> {
        self.user.as_ref().ok_or(AppError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
