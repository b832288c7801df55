//! SQLite-backed user directory and admin user management.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{Instrument, info, info_span};

use super::{
    directory::{User, UserDirectory},
    utils::{is_unique_violation, valid_username},
};

/// Outcome when attempting to create a user.
#[derive(Debug, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created,
    Conflict,
}

#[derive(Clone, Debug)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn lookup_user(&self, username: &str) -> Result<Option<User>> {
        lookup_user(&self.pool, username).await
    }
}

pub(crate) async fn lookup_user(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let query = "SELECT username, password, is_admin FROM users WHERE username = ?";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user")?;

    Ok(row.map(|row| User {
        username: row.get("username"),
        password: row.get("password"),
        is_admin: row.get("is_admin"),
    }))
}

pub(crate) async fn create_user(pool: &SqlitePool, user: &User) -> Result<CreateUserOutcome> {
    let query = r"
        INSERT INTO users
            (username, password, is_admin, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    let now = Utc::now().timestamp();
    let result = sqlx::query(query)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.is_admin)
        .bind(now)
        .bind(now)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(CreateUserOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(CreateUserOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Create the bootstrap admin unless a user with that name already exists.
///
/// # Errors
/// Returns an error if the username is not valid or the insert fails for any
/// reason other than a conflict.
pub async fn ensure_admin(pool: &SqlitePool, username: &str, password: &str) -> Result<()> {
    if !valid_username(username) {
        anyhow::bail!("Invalid admin username: {username:?}");
    }
    let user = User {
        username: username.to_string(),
        password: password.to_string(),
        is_admin: true,
    };
    match create_user(pool, &user).await? {
        CreateUserOutcome::Created => info!("Created bootstrap admin user {username}"),
        CreateUserOutcome::Conflict => info!("Bootstrap admin user {username} already exists"),
    }
    Ok(())
}
