//! Database helpers for expense and income rows.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use tracing::{Instrument, info_span};

use super::{Entry, EntryKind};

/// Number of rows the list fragment shows.
pub(super) const RECENT_LIMIT: i64 = 10;

pub(crate) async fn insert_entry(
    pool: &SqlitePool,
    kind: EntryKind,
    amount: &str,
    source: &str,
    now: i64,
) -> Result<i64> {
    let query = format!(
        "INSERT INTO {} (amount, source, created_at, updated_at) VALUES (?, ?, ?, ?)",
        kind.table()
    );
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let result = sqlx::query(&query)
        .bind(amount)
        .bind(source)
        .bind(now)
        .bind(now)
        .execute(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to insert {}", kind.singular()))?;

    Ok(result.last_insert_rowid())
}

/// Most recent live rows, newest first.
pub(crate) async fn recent_entries(pool: &SqlitePool, kind: EntryKind) -> Result<Vec<Entry>> {
    let query = format!(
        "SELECT id, amount, source, created_at FROM {} WHERE deleted_at IS NULL ORDER BY created_at DESC, id DESC LIMIT ?",
        kind.table()
    );
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(RECENT_LIMIT)
        .fetch_all(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to list {}", kind.table()))?;

    Ok(rows
        .into_iter()
        .map(|row| Entry {
            id: row.get("id"),
            amount: row.get("amount"),
            source: row.get("source"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Amounts of every live row, as stored.
pub(crate) async fn live_amounts(pool: &SqlitePool, kind: EntryKind) -> Result<Vec<String>> {
    let query = format!("SELECT amount FROM {} WHERE deleted_at IS NULL", kind.table());
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to read {} amounts", kind.singular()))?;

    Ok(rows.into_iter().map(|row| row.get("amount")).collect())
}

/// Soft delete; returns whether a live row was hit.
pub(crate) async fn soft_delete_entry(
    pool: &SqlitePool,
    kind: EntryKind,
    id: i64,
    now: i64,
) -> Result<bool> {
    let query = format!(
        "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        kind.table()
    );
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let result = sqlx::query(&query)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to delete {}", kind.singular()))?;

    Ok(result.rows_affected() > 0)
}
