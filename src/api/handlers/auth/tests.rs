//! Session authenticator behavior against an in-memory user directory.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header::COOKIE};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;
use std::{collections::HashMap, sync::Arc};

use super::{
    ACCESS_TOKEN_COOKIE, AuthConfig, AuthError, MAX_SESSION_TTL_SECONDS, Role,
    SessionAuthenticator, User, UserDirectory,
};

const SECRET: &str = "0123456789abcdef0123456789abcdef";
const OTHER_SECRET: &str = "fedcba9876543210fedcba9876543210";
const WEEK: i64 = 7 * 24 * 60 * 60;

#[derive(Default)]
struct MemoryDirectory {
    users: HashMap<String, User>,
}

impl MemoryDirectory {
    fn with_user(mut self, username: &str, password: &str, is_admin: bool) -> Self {
        self.users.insert(
            username.to_string(),
            User {
                username: username.to_string(),
                password: password.to_string(),
                is_admin,
            },
        );
        self
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn lookup_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.get(username).cloned())
    }
}

struct BrokenDirectory;

#[async_trait]
impl UserDirectory for BrokenDirectory {
    async fn lookup_user(&self, _username: &str) -> Result<Option<User>> {
        Err(anyhow!("database is locked"))
    }
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

fn config(secret: &str) -> Result<AuthConfig> {
    AuthConfig::new(SecretString::from(secret.to_string()))
}

fn directory() -> MemoryDirectory {
    MemoryDirectory::default()
        .with_user("alice", "pw1", false)
        .with_user("root", "toor", true)
}

fn authenticator(secret: &str, directory: impl UserDirectory + 'static) -> Result<SessionAuthenticator> {
    Ok(SessionAuthenticator::new(config(secret)?, Arc::new(directory)))
}

fn cookies(values: &[&str]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for value in values {
        headers.append(COOKIE, HeaderValue::from_str(value)?);
    }
    Ok(headers)
}

fn session(token: &str) -> Result<HeaderMap> {
    cookies(&[&format!("{ACCESS_TOKEN_COOKIE}={token}")])
}

// Signs arbitrary header and claims JSON with a valid HS256 MAC.
fn forge(header: &str, claims: &str, secret: &str) -> Result<String> {
    let signing_input = format!(
        "{}.{}",
        Base64UrlUnpadded::encode_string(header.as_bytes()),
        Base64UrlUnpadded::encode_string(claims.as_bytes())
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| anyhow!("invalid hmac key"))?;
    mac.update(signing_input.as_bytes());
    let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
    Ok(format!("{signing_input}.{signature}"))
}

#[tokio::test]
async fn issue_then_verify_any_role() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    assert_eq!(issued.username, "alice");
    assert_eq!(issued.expires_at, now() + Duration::seconds(WEEK));

    let identity = auth
        .verify_at(&session(&issued.token)?, Role::Any, now())
        .await?;
    assert_eq!(identity.username, "alice");
    assert!(!identity.is_admin);
    Ok(())
}

#[tokio::test]
async fn non_admin_is_forbidden_on_admin_check() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    let result = auth
        .verify_at(&session(&issued.token)?, Role::Admin, now())
        .await;
    assert!(matches!(result, Err(AuthError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn admin_passes_admin_check() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("root", "toor", &HeaderMap::new(), now())
        .await?;

    let identity = auth
        .verify_at(&session(&issued.token)?, Role::Admin, now())
        .await?;
    assert_eq!(identity.username, "root");
    assert!(identity.is_admin);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let empty = HeaderMap::new();

    for (username, password) in [
        ("alice", "wrong"),
        ("alice", "pw"),
        ("alice", "pw1x"),
        ("mallory", "pw1"),
        ("", "pw1"),
        ("alice", ""),
    ] {
        let result = auth.issue_at(username, password, &empty, now()).await;
        assert!(
            matches!(result, Err(AuthError::InvalidCredentials)),
            "{username}/{password} should be rejected"
        );
    }
    Ok(())
}

#[tokio::test]
async fn missing_cookie_is_unauthenticated() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;

    let result = auth.verify_at(&HeaderMap::new(), Role::Any, now()).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));

    let result = auth
        .verify_at(&cookies(&["theme=dark; user=alice"])?, Role::Any, now())
        .await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn token_expires() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;
    let headers = session(&issued.token)?;

    let just_before = issued.expires_at - Duration::seconds(1);
    assert!(auth.verify_at(&headers, Role::Any, just_before).await.is_ok());

    for at in [issued.expires_at, issued.expires_at + Duration::days(1)] {
        let result = auth.verify_at(&headers, Role::Any, at).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
    Ok(())
}

#[tokio::test]
async fn token_from_other_secret_is_rejected() -> Result<()> {
    let issuer = authenticator(OTHER_SECRET, directory())?;
    let verifier = authenticator(SECRET, directory())?;
    let issued = issuer
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    let result = verifier
        .verify_at(&session(&issued.token)?, Role::Any, now())
        .await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn foreign_algorithms_are_rejected() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let exp = (now() + Duration::hours(1)).timestamp();
    let claims = format!(r#"{{"sub":"root","exp":{exp}}}"#);

    let unsigned = format!(
        "{}.{}.",
        Base64UrlUnpadded::encode_string(br#"{"alg":"none","typ":"JWT"}"#),
        Base64UrlUnpadded::encode_string(claims.as_bytes())
    );
    let rs256 = forge(r#"{"alg":"RS256","typ":"JWT"}"#, &claims, SECRET)?;
    let hs512 = forge(r#"{"alg":"HS512","typ":"JWT"}"#, &claims, SECRET)?;

    for token in [unsigned, rs256, hs512] {
        let result = auth.verify_at(&session(&token)?, Role::Any, now()).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)), "{token}");
    }

    // Sanity: the same claims under HS256 are accepted.
    let hs256 = forge(r#"{"alg":"HS256","typ":"JWT"}"#, &claims, SECRET)?;
    assert!(auth.verify_at(&session(&hs256)?, Role::Admin, now()).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn claims_must_have_the_exact_shape() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let exp = (now() + Duration::hours(1)).timestamp();
    let header = r#"{"alg":"HS256","typ":"JWT"}"#;

    for claims in [
        format!(r#"{{"sub":"root","exp":{exp},"admin":true}}"#),
        format!(r#"{{"sub":"root","exp":"{exp}"}}"#),
        r#"{"sub":"root"}"#.to_string(),
        format!(r#"{{"sub":"","exp":{exp}}}"#),
    ] {
        let token = forge(header, &claims, SECRET)?;
        let result = auth.verify_at(&session(&token)?, Role::Any, now()).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)), "{claims}");
    }
    Ok(())
}

#[tokio::test]
async fn deleted_user_loses_access() -> Result<()> {
    let issuer = authenticator(SECRET, directory())?;
    let issued = issuer
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    let verifier = authenticator(SECRET, MemoryDirectory::default().with_user("root", "toor", true))?;
    let result = verifier
        .verify_at(&session(&issued.token)?, Role::Any, now())
        .await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn first_matching_cookie_wins() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;
    let valid = format!("{ACCESS_TOKEN_COOKIE}={}", issued.token);
    let garbage = format!("{ACCESS_TOKEN_COOKIE}=garbage");

    let headers = cookies(&[&valid, &garbage])?;
    assert!(auth.verify_at(&headers, Role::Any, now()).await.is_ok());

    let headers = cookies(&[&garbage, &valid])?;
    let result = auth.verify_at(&headers, Role::Any, now()).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));

    let headers = cookies(&[&format!("user=alice; {garbage}; {valid}")])?;
    let result = auth.verify_at(&headers, Role::Any, now()).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn login_with_live_session_is_already_authenticated() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;
    let headers = session(&issued.token)?;

    let result = auth.issue_at("alice", "pw1", &headers, now()).await;
    assert!(matches!(result, Err(AuthError::AlreadyAuthenticated)));

    // Bad credentials are still reported as such.
    let result = auth.issue_at("alice", "nope", &headers, now()).await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));

    // An expired session does not block a new login.
    let later = issued.expires_at + Duration::seconds(1);
    assert!(auth.issue_at("alice", "pw1", &headers, later).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn logout_expires_cookie_but_not_the_token() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    let [access, user] = auth.logout()?;
    let access = access.to_str()?;
    assert!(access.starts_with(&format!("{ACCESS_TOKEN_COOKIE}=;")));
    assert!(access.contains("Max-Age=0"));
    assert!(access.contains("HttpOnly"));
    assert!(user.to_str()?.starts_with("user=;"));

    // A browser honoring the expired cookie sends an empty value.
    let cleared = cookies(&[&format!("{ACCESS_TOKEN_COOKIE}=")])?;
    let result = auth.verify_at(&cleared, Role::Any, now()).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));

    // A copy kept from before the logout still works until it expires.
    assert!(
        auth.verify_at(&session(&issued.token)?, Role::Any, now())
            .await
            .is_ok()
    );
    Ok(())
}

#[tokio::test]
async fn session_cookies_carry_expiry() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    let [access, user] = auth.session_cookies(&issued)?;
    let access = access.to_str()?;
    assert!(access.starts_with(&format!("{ACCESS_TOKEN_COOKIE}={};", issued.token)));
    assert!(access.contains("Path=/"));
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Expires=Mon, 08 Jan 2024 00:00:00 GMT"));
    assert!(access.contains(&format!("Max-Age={WEEK}")));
    assert!(!access.contains("Secure"));

    let user = user.to_str()?;
    assert!(user.starts_with("user=alice;"));
    assert!(!user.contains("HttpOnly"));
    Ok(())
}

#[tokio::test]
async fn secure_cookies_flag() -> Result<()> {
    let auth = SessionAuthenticator::new(
        config(SECRET)?.with_secure_cookies(true),
        Arc::new(directory()),
    );
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;

    for cookie in auth.session_cookies(&issued)?.iter().chain(auth.logout()?.iter()) {
        assert!(cookie.to_str()?.ends_with("; Secure"));
    }
    Ok(())
}

#[tokio::test]
async fn directory_failure_is_internal() -> Result<()> {
    let auth = authenticator(SECRET, BrokenDirectory)?;

    let result = auth.issue_at("alice", "pw1", &HeaderMap::new(), now()).await;
    match result {
        Err(err @ AuthError::Directory(_)) => {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        other => return Err(anyhow!("expected directory error, got {other:?}")),
    }

    let token = forge(
        r#"{"alg":"HS256","typ":"JWT"}"#,
        &format!(r#"{{"sub":"alice","exp":{}}}"#, now().timestamp() + 60),
        SECRET,
    )?;
    let result = auth.verify_at(&session(&token)?, Role::Any, now()).await;
    assert!(matches!(result, Err(AuthError::Directory(_))));
    Ok(())
}

#[tokio::test]
async fn custom_ttl_is_used() -> Result<()> {
    let auth = SessionAuthenticator::new(
        config(SECRET)?.with_session_ttl_seconds(60)?,
        Arc::new(directory()),
    );
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;
    assert_eq!(issued.expires_at, now() + Duration::seconds(60));

    let headers = session(&issued.token)?;
    let result = auth
        .verify_at(&headers, Role::Any, now() + Duration::seconds(60))
        .await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
    Ok(())
}

#[tokio::test]
async fn stale_cookie_for_deleted_user_does_not_block_login() -> Result<()> {
    let auth = authenticator(SECRET, directory())?;
    let exp = (now() + Duration::hours(1)).timestamp();
    let ghost = forge(
        r#"{"alg":"HS256","typ":"JWT"}"#,
        &format!(r#"{{"sub":"ghost","exp":{exp}}}"#),
        SECRET,
    )?;
    let headers = session(&ghost)?;

    let result = auth.verify_at(&headers, Role::Any, now()).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));

    let issued = auth.issue_at("alice", "pw1", &headers, now()).await?;
    assert_eq!(issued.username, "alice");
    Ok(())
}

#[tokio::test]
async fn longest_allowed_ttl_issues_without_overflow() -> Result<()> {
    let auth = SessionAuthenticator::new(
        config(SECRET)?.with_session_ttl_seconds(MAX_SESSION_TTL_SECONDS)?,
        Arc::new(directory()),
    );
    let issued = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), now())
        .await?;
    assert_eq!(
        issued.expires_at,
        now() + Duration::seconds(MAX_SESSION_TTL_SECONDS)
    );

    // Near the end of chrono's range the same TTL is reported, not panicked on.
    let result = auth
        .issue_at("alice", "pw1", &HeaderMap::new(), DateTime::<Utc>::MAX_UTC)
        .await;
    assert!(matches!(result, Err(AuthError::SessionLifetime(_))));
    Ok(())
}
