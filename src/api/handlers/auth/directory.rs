//! User directory seam consumed by the session authenticator.

use async_trait::async_trait;
use std::fmt;

/// A stored user as seen by the authenticator.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"***")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Lookup of users by username.
///
/// `Ok(None)` means the user does not exist; `Err` is reserved for storage failures.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup_user(&self, username: &str) -> anyhow::Result<Option<User>>;
}
