//! Admin-only user management endpoints.
//!
//! Both handlers sit behind [`super::require_admin`]; they never see an
//! unauthenticated request.

use axum::{
    Form,
    extract::{Extension, Query},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use sqlx::SqlitePool;
use tracing::{error, info};

use super::{
    directory::User,
    principal::Identity,
    storage::{CreateUserOutcome, create_user as insert_user, lookup_user},
    types::{CreateUserForm, UserQuery},
    utils::valid_username,
};
use crate::api::handlers::fragments;

#[utoipa::path(
    get,
    path = "/api/v1/admin/user",
    params(UserQuery),
    responses(
        (status = 200, description = "User fragment", content_type = "text/html"),
        (status = 400, description = "Username is required"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "admin"
)]
pub async fn get_user(pool: Extension<SqlitePool>, Query(query): Query<UserQuery>) -> impl IntoResponse {
    let username = query.username.unwrap_or_default();
    let username = username.trim();
    if username.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h1>Username is required</h1>".to_string()),
        );
    }

    match lookup_user(&pool, username).await {
        Ok(Some(user)) => (StatusCode::OK, Html(fragments::user(&user))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Html("<h1>User not found</h1>".to_string()),
        ),
        Err(err) => {
            error!("Failed to lookup user: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Internal Server Error</h1>".to_string()),
            )
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/user",
    request_body(content = CreateUserForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "User created", content_type = "text/html"),
        (status = 400, description = "Missing or invalid username/password"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
        (status = 409, description = "Username already exists")
    ),
    tag = "admin"
)]
pub async fn create_user(
    pool: Extension<SqlitePool>,
    identity: Extension<Identity>,
    Form(form): Form<CreateUserForm>,
) -> impl IntoResponse {
    if form.username.is_empty() || form.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h1>Username and Password are required</h1>"),
        );
    }
    if !valid_username(&form.username) {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h1>Username may only contain letters, digits and . _ @ -</h1>"),
        );
    }

    let user = User {
        is_admin: form.wants_admin(),
        username: form.username,
        password: form.password,
    };

    match insert_user(&pool, &user).await {
        Ok(CreateUserOutcome::Created) => {
            info!(
                created = %user.username,
                admin = user.is_admin,
                by = %identity.username,
                "User created"
            );
            (StatusCode::OK, Html("<h1>User created</h1>"))
        }
        Ok(CreateUserOutcome::Conflict) => {
            (StatusCode::CONFLICT, Html("<h1>User already exists</h1>"))
        }
        Err(err) => {
            error!("Failed to create user: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Failed to create user</h1>"),
            )
        }
    }
}
