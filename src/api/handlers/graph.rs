use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tracing::error;

use super::{
    fragments,
    ledger::{EntryKind, parse_amount, storage::live_amounts},
};

#[utoipa::path(
    get,
    path = "/api/v1/graph",
    responses(
        (status = 200, description = "Bar chart of total expenses and incomes", content_type = "text/html"),
        (status = 500, description = "Stored amounts could not be read or parsed")
    ),
    tag = "ledger"
)]
// axum handler for the totals graph
pub async fn graph(pool: Extension<SqlitePool>) -> impl IntoResponse {
    let expenses = match total(&pool, EntryKind::Expense).await {
        Ok(total) => total,
        Err(response) => return response,
    };
    let incomes = match total(&pool, EntryKind::Income).await {
        Ok(total) => total,
        Err(response) => return response,
    };

    Html(fragments::graph(expenses, incomes)).into_response()
}

async fn total(pool: &SqlitePool, kind: EntryKind) -> Result<f64, Response> {
    let amounts = live_amounts(pool, kind).await.map_err(|err| {
        error!("Failed to get {}: {err:#}", kind.table());
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get {}", kind.table()),
        )
            .into_response()
    })?;

    let mut total = 0.0;
    for amount in amounts {
        let Some(value) = parse_amount(&amount) else {
            error!("Stored {} amount is not a number: {amount:?}", kind.singular());
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to parse {} amount", kind.singular()),
            )
                .into_response());
        };
        total += value;
    }
    Ok(total)
}
