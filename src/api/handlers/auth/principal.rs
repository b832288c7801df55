//! Authenticated identity and the admin gate.
//!
//! Flow Overview: read the `access-token` cookie, resolve it to a user through
//! the authenticator, and stash the identity in request extensions so gated
//! handlers can read it with `Extension<Identity>`.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::authenticator::SessionAuthenticator;

/// Role a request must hold to pass verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Any,
    Admin,
}

/// Authenticated user context derived from the session cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub is_admin: bool,
}

/// Middleware for routes that only admins may reach.
///
/// Missing or invalid sessions get 401, non-admin sessions get 403.
pub async fn require_admin(
    Extension(authenticator): Extension<Arc<SessionAuthenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticator.verify(request.headers(), Role::Admin).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
