//! Session authentication for the admin area.
//!
//! Logins are checked against the user directory and answered with an
//! `HS256`-signed token in the `access-token` cookie, plus a `user` cookie the
//! UI reads for display. Every gated request re-verifies the token and
//! re-resolves its subject; nothing about the session is stored server side.
//!
//! ## Session lifetime
//!
//! Expiration is fixed at login (seven days by default) and is never extended.
//! Logout only tells the browser to drop the cookies, so a copied token keeps
//! working until it expires. Rotating the session secret invalidates every
//! outstanding token at once.

pub(crate) mod admin;
mod authenticator;
mod cookies;
mod directory;
mod error;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
mod storage;
mod token;
pub(crate) mod types;
mod utils;

pub use authenticator::{IssuedSession, SessionAuthenticator};
pub use cookies::{ACCESS_TOKEN_COOKIE, USER_COOKIE};
pub use directory::{User, UserDirectory};
pub use error::AuthError;
pub use principal::{Identity, Role, require_admin};
pub use state::{AuthConfig, MAX_SESSION_TTL_SECONDS, MIN_SECRET_LENGTH};
pub use storage::{SqliteUserDirectory, ensure_admin};
pub use token::{SessionClaims, TokenError, sign_hs256, verify_hs256};

#[cfg(test)]
mod tests;
