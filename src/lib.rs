//! # Finance (Personal Finance Tracker)
//!
//! `finance` serves a small htmx front end and an HTTP API for recording
//! expenses and incomes and for drawing a summary graph of both totals.
//!
//! ## Sessions
//!
//! Users log in with a username and password checked against the `users` table.
//! A successful login issues an `HS256` signed token carried in the
//! `access-token` cookie, next to a non-HttpOnly `user` cookie with the display
//! name. Every later request presents the cookie and the
//! [`SessionAuthenticator`](api::handlers::auth::SessionAuthenticator)
//! verifies the signature, the expiry and, for admin routes, the role.
//!
//! ## Ledger
//!
//! Entries are stored in `SQLite` and are soft deleted: removing an expense
//! or an income only sets `deleted_at`, and every listing and total skips it.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn schema_sql_declares_soft_delete_columns() {
        let sql = include_str!("../sql/schema.sql").to_ascii_lowercase();
        for table in ["users", "expenses", "incomes"] {
            assert!(
                sql.contains(&format!("create table if not exists {table}")),
                "missing table {table}"
            );
        }
        assert!(sql.matches("deleted_at").count() >= 2);
    }
}
