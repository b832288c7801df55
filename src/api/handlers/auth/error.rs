use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use super::token::TokenError;

/// Failure kinds of the session authenticator.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Already logged in")]
    AlreadyAuthenticated,
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
    #[error("user directory failure")]
    Directory(#[source] anyhow::Error),
    #[error("failed to sign session token")]
    Signing(#[from] TokenError),
    #[error("session lifetime of {0}s is out of range")]
    SessionLifetime(i64),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AlreadyAuthenticated => StatusCode::ACCEPTED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Directory(_) | Self::Signing(_) | Self::SessionLifetime(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Directory(_) | Self::Signing(_) | Self::SessionLifetime(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Html(format!("<h1>{message}</h1>"))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::AlreadyAuthenticated.status(), StatusCode::ACCEPTED);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Directory(anyhow::anyhow!("db down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::SessionLifetime(i64::MAX).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn directory_error_does_not_leak_cause() {
        let response = AuthError::Directory(anyhow::anyhow!("db down")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn already_authenticated_message() {
        assert_eq!(AuthError::AlreadyAuthenticated.to_string(), "Already logged in");
    }
}
