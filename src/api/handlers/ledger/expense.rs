//! `/api/v1/expense` endpoints.

use axum::{
    Form,
    extract::{Extension, Path},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use super::EntryKind;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ExpenseForm {
    #[serde(default)]
    pub amount: String,
    /// Where the money went.
    #[serde(default)]
    pub expense: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/expense",
    responses(
        (status = 200, description = "Ten most recent expenses", content_type = "text/html"),
        (status = 500, description = "Failed to get expenses")
    ),
    tag = "ledger"
)]
pub async fn list(pool: Extension<SqlitePool>) -> impl IntoResponse {
    super::list(&pool, EntryKind::Expense).await
}

#[utoipa::path(
    post,
    path = "/api/v1/expense",
    request_body(content = ExpenseForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Expense stored, refreshed list", content_type = "text/html"),
        (status = 400, description = "Invalid amount or missing source"),
        (status = 500, description = "Failed to add expense")
    ),
    tag = "ledger"
)]
pub async fn add(pool: Extension<SqlitePool>, Form(form): Form<ExpenseForm>) -> impl IntoResponse {
    super::add(&pool, EntryKind::Expense, &form.amount, &form.expense).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/expense/{id}",
    params(("id" = String, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense removed, refreshed list", content_type = "text/html"),
        (status = 400, description = "Invalid expense ID"),
        (status = 500, description = "Failed to delete expense")
    ),
    tag = "ledger"
)]
pub async fn delete(pool: Extension<SqlitePool>, Path(id): Path<String>) -> impl IntoResponse {
    super::delete(&pool, EntryKind::Expense, &id).await
}
