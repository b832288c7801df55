//! Small helpers for user validation and storage errors.

use regex::Regex;
use std::sync::OnceLock;

/// Usernames end up in the `user` cookie verbatim, keep them cookie-safe.
pub(super) fn valid_username(username: &str) -> bool {
    static USERNAME: OnceLock<Option<Regex>> = OnceLock::new();
    USERNAME
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9._@-]{1,64}$").ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(username))
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
