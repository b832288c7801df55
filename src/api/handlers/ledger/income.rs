//! `/api/v1/income` endpoints.

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
pub struct IncomeForm {
    #[serde(default)]
    pub amount: String,
    /// Where the money came from.
    #[serde(default)]
    pub income: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/income",
    responses(
        (status = 200, description = "Ten most recent incomes", content_type = "text/html"),
        (status = 500, description = "Failed to get incomes")
    ),
    tag = "ledger"
)]
pub async fn list(pool: Extension<SqlitePool>) -> impl IntoResponse {
    super::list(&pool, EntryKind::Income).await
}

#[utoipa::path(
    post,
    path = "/api/v1/income",
    request_body(content = IncomeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Income stored, refreshed list", content_type = "text/html"),
        (status = 400, description = "Invalid amount or missing source"),
        (status = 500, description = "Failed to add income")
    ),
    tag = "ledger"
)]
pub async fn add(pool: Extension<SqlitePool>, Form(form): Form<IncomeForm>) -> impl IntoResponse {
    super::add(&pool, EntryKind::Income, &form.amount, &form.income).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/income/{id}",
    params(("id" = String, Path, description = "Income id")),
    responses(
        (status = 200, description = "Income removed, refreshed list", content_type = "text/html"),
        (status = 400, description = "Invalid income ID"),
        (status = 500, description = "Failed to delete income")
    ),
    tag = "ledger"
)]
pub async fn delete(pool: Extension<SqlitePool>, Path(id): Path<String>) -> impl IntoResponse {
    super::delete(&pool, EntryKind::Income, &id).await
}
