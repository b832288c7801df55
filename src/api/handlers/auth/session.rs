//! Login and logout endpoints.

use axum::{
    Form,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse},
};
use std::sync::Arc;
use tracing::{error, info};

use super::{authenticator::SessionAuthenticator, types::LoginForm};

#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session issued, cookies set"),
        (status = 202, description = "Already logged in"),
        (status = 401, description = "Invalid username or password")
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    authenticator: Extension<Arc<SessionAuthenticator>>,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let session = match authenticator
        .issue(&form.username, &form.password, &headers)
        .await
    {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    let cookies = match authenticator.session_cookies(&session) {
        Ok(cookies) => cookies,
        Err(err) => {
            error!("Failed to build session cookies: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Internal Server Error</h1>"),
            )
                .into_response();
        }
    };

    info!(username = %session.username, "Session issued");

    let mut response_headers = HeaderMap::new();
    for cookie in cookies {
        response_headers.append(SET_COOKIE, cookie);
    }
    (StatusCode::OK, response_headers, Html("<h1>Logged in</h1>")).into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/logout",
    responses(
        (status = 200, description = "Session cookies cleared")
    ),
    tag = "auth"
)]
pub async fn logout(authenticator: Extension<Arc<SessionAuthenticator>>) -> impl IntoResponse {
    // Always clear the cookies, even when no session was presented.
    let mut response_headers = HeaderMap::new();
    match authenticator.logout() {
        Ok(cookies) => {
            for cookie in cookies {
                response_headers.append(SET_COOKIE, cookie);
            }
        }
        Err(err) => error!("Failed to build logout cookies: {err}"),
    }
    (StatusCode::OK, response_headers, Html("<h1>Logged out</h1>"))
}
