//! Expense and income ledger.
//!
//! Both kinds share one table layout and one implementation; [`EntryKind`]
//! selects the table and the wording of messages, while the thin `expense` and
//! `income` modules only own their routes and form field names. Every mutating
//! endpoint answers with the refreshed list fragment so htmx can swap it in place.

pub mod expense;
pub mod income;
pub(crate) mod storage;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error};

use super::fragments;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Expense => "expenses",
            Self::Income => "incomes",
        }
    }

    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub amount: String,
    pub source: String,
    pub created_at: i64,
}

/// Amounts must be finite decimal numbers; the submitted text is what gets stored.
pub(crate) fn parse_amount(amount: &str) -> Option<f64> {
    amount.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) async fn list(pool: &SqlitePool, kind: EntryKind) -> Response {
    match storage::recent_entries(pool, kind).await {
        Ok(entries) => Html(fragments::entries(kind, &entries)).into_response(),
        Err(err) => {
            error!("Failed to get {}: {err:#}", kind.table());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to get {}", kind.table()),
            )
                .into_response()
        }
    }
}

pub(crate) async fn add(pool: &SqlitePool, kind: EntryKind, amount: &str, source: &str) -> Response {
    let amount = amount.trim();
    let source = source.trim();
    if parse_amount(amount).is_none() {
        return (StatusCode::BAD_REQUEST, "Invalid amount").into_response();
    }
    if source.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            format!("Missing {} source", kind.singular()),
        )
            .into_response();
    }

    if let Err(err) =
        storage::insert_entry(pool, kind, amount, source, Utc::now().timestamp()).await
    {
        error!("Failed to add {}: {err:#}", kind.singular());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to add {}", kind.singular()),
        )
            .into_response();
    }

    list(pool, kind).await
}

pub(crate) async fn delete(pool: &SqlitePool, kind: EntryKind, id: &str) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return (
            StatusCode::BAD_REQUEST,
            format!("Invalid {} ID", kind.singular()),
        )
            .into_response();
    };

    match storage::soft_delete_entry(pool, kind, id, Utc::now().timestamp()).await {
        Ok(true) => {}
        Ok(false) => debug!("No live {} with id {id}", kind.singular()),
        Err(err) => {
            error!("Failed to delete {}: {err:#}", kind.singular());
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to delete {}", kind.singular()),
            )
                .into_response();
        }
    }

    list(pool, kind).await
}
