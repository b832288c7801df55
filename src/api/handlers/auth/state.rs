//! Session configuration injected into the authenticator.

use anyhow::{Result, bail};
use secrecy::{ExposeSecret, SecretString};

pub const MIN_SECRET_LENGTH: usize = 32;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
/// Upper bound on the session lifetime: ten years.
pub const MAX_SESSION_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret: SecretString,
    session_ttl_seconds: i64,
    secure_cookies: bool,
}

impl AuthConfig {
    /// Build a config around the process-wide signing secret.
    ///
    /// # Errors
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LENGTH`] bytes.
    pub fn new(secret: SecretString) -> Result<Self> {
        if secret.expose_secret().len() < MIN_SECRET_LENGTH {
            bail!("Session secret must be at least {MIN_SECRET_LENGTH} bytes long");
        }

        Ok(Self {
            secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure_cookies: false,
        })
    }

    /// Override the session lifetime.
    ///
    /// # Errors
    /// Returns an error unless `0 < seconds <= MAX_SESSION_TTL_SECONDS`.
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Result<Self> {
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&seconds) {
            bail!(
                "Session TTL must be between 1 and {MAX_SESSION_TTL_SECONDS} seconds, got {seconds}"
            );
        }
        self.session_ttl_seconds = seconds;
        Ok(self)
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub(super) fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}
