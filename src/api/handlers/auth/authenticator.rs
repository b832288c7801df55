//! Session authenticator: issue, verify and log out signed cookie sessions.
//!
//! Flow Overview:
//! 1) `issue` checks the submitted credentials against the user directory and
//!    signs `{sub, exp}` with the process-wide secret.
//! 2) `verify` reads the `access-token` cookie, validates the token and
//!    re-resolves the subject so deleted users lose access immediately.
//! 3) `logout` hands back expired cookies; tokens are not revoked server side.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, error};

use super::{
    cookies::{
        ACCESS_TOKEN_COOKIE, USER_COOKIE, display_name_cookie, expired_cookie, find_cookie,
        session_cookie,
    },
    directory::{User, UserDirectory},
    error::AuthError,
    principal::{Identity, Role},
    state::AuthConfig,
    token::{SessionClaims, sign_hs256, verify_hs256},
};

/// A freshly signed session.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionAuthenticator {
    config: AuthConfig,
    directory: Arc<dyn UserDirectory>,
}

impl SessionAuthenticator {
    #[must_use]
    pub fn new(config: AuthConfig, directory: Arc<dyn UserDirectory>) -> Self {
        Self { config, directory }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issue a session for `username` if the credentials match.
    ///
    /// # Errors
    /// See [`Self::issue_at`].
    pub async fn issue(
        &self,
        username: &str,
        password: &str,
        presented: &HeaderMap,
    ) -> Result<IssuedSession, AuthError> {
        self.issue_at(username, password, presented, Utc::now())
            .await
    }

    /// Issue a session using `now` as the clock.
    ///
    /// # Errors
    /// - `InvalidCredentials` when a field is empty, the user is unknown or the password differs.
    /// - `AlreadyAuthenticated` when `presented` already carries a valid session.
    /// - `Directory` when the lookup itself fails.
    /// - `SessionLifetime` when `now` plus the TTL leaves the representable range.
    pub async fn issue_at(
        &self,
        username: &str,
        password: &str,
        presented: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.lookup(username).await? else {
            debug!("Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !bool::from(user.password.as_bytes().ct_eq(password.as_bytes())) {
            debug!("Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if self.has_valid_session(presented, now).await? {
            return Err(AuthError::AlreadyAuthenticated);
        }

        let ttl = self.config.session_ttl_seconds();
        let expires_at = Duration::try_seconds(ttl)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                error!("Session lifetime of {ttl}s overflows the clock");
                AuthError::SessionLifetime(ttl)
            })?;
        let claims = SessionClaims {
            sub: user.username.clone(),
            exp: expires_at.timestamp(),
        };
        let token = sign_hs256(self.config.secret_bytes(), &claims).map_err(|err| {
            error!("Failed to sign session token: {err}");
            AuthError::from(err)
        })?;

        Ok(IssuedSession {
            username: user.username,
            token,
            expires_at,
        })
    }

    /// Resolve the presented session cookie into an identity that satisfies `role`.
    ///
    /// # Errors
    /// See [`Self::verify_at`].
    pub async fn verify(
        &self,
        presented: &HeaderMap,
        role: Role,
    ) -> Result<Identity, AuthError> {
        self.verify_at(presented, role, Utc::now()).await
    }

    /// Verify using `now` as the clock.
    ///
    /// # Errors
    /// - `Unauthenticated` when the cookie is missing, the token is invalid or
    ///   expired, or the subject no longer exists.
    /// - `Forbidden` when `role` is [`Role::Admin`] and the user is not an admin.
    /// - `Directory` when the lookup itself fails.
    pub async fn verify_at(
        &self,
        presented: &HeaderMap,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let Some(token) = find_cookie(presented, ACCESS_TOKEN_COOKIE) else {
            return Err(AuthError::Unauthenticated);
        };

        let claims = verify_hs256(&token, self.config.secret_bytes(), now.timestamp())
            .map_err(|err| {
                debug!("Rejected session token: {err}");
                AuthError::Unauthenticated
            })?;

        let Some(user) = self.lookup(&claims.sub).await? else {
            debug!("Session subject no longer exists");
            return Err(AuthError::Unauthenticated);
        };

        if role == Role::Admin && !user.is_admin {
            return Err(AuthError::Forbidden);
        }

        Ok(Identity {
            username: user.username,
            is_admin: user.is_admin,
        })
    }

    /// Cookies that make the client drop its session.
    ///
    /// # Errors
    /// Returns an error if a header value cannot be built.
    pub fn logout(&self) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
        let secure = self.config.secure_cookies();
        Ok([
            expired_cookie(ACCESS_TOKEN_COOKIE, true, secure)?,
            expired_cookie(USER_COOKIE, false, secure)?,
        ])
    }

    /// Cookies carrying a freshly issued session.
    ///
    /// # Errors
    /// Returns an error if a header value cannot be built.
    pub fn session_cookies(
        &self,
        session: &IssuedSession,
    ) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
        let max_age = self.config.session_ttl_seconds();
        let secure = self.config.secure_cookies();
        Ok([
            session_cookie(&session.token, session.expires_at, max_age, secure)?,
            display_name_cookie(&session.username, session.expires_at, max_age, secure)?,
        ])
    }

    async fn lookup(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.directory.lookup_user(username).await.map_err(|err| {
            error!("Failed to lookup user: {err:#}");
            AuthError::Directory(err)
        })
    }

    // Same rules as `verify_at`: a cookie for a deleted user is not a session.
    async fn has_valid_session(
        &self,
        presented: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        match self.verify_at(presented, Role::Any, now).await {
            Ok(_) => Ok(true),
            Err(err @ AuthError::Directory(_)) => Err(err),
            Err(_) => Ok(false),
        }
    }
}
