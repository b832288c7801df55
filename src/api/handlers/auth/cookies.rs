//! Cookie transport for the session token and the display-name cookie.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use chrono::{DateTime, Utc};

pub const ACCESS_TOKEN_COOKIE: &str = "access-token";
pub const USER_COOKIE: &str = "user";

const EXPIRED_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Format a timestamp as an RFC 7231 `HTTP-date`.
pub(crate) fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Find the first cookie named `name` across every `Cookie` header, in order.
pub(crate) fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let Some(key) = parts.next().map(str::trim) else {
                continue;
            };
            let Some(val) = parts.next().map(str::trim) else {
                continue;
            };
            if key == name {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn with_secure(mut cookie: String, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `HttpOnly` transport cookie carrying the signed token.
pub(crate) fn session_cookie(
    token: &str,
    expires_at: DateTime<Utc>,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let expires = http_date(expires_at);
    with_secure(
        format!(
            "{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; Expires={expires}; Max-Age={max_age_seconds}; SameSite=Lax"
        ),
        secure,
    )
}

/// Build the display-name cookie. Readable by scripts, never trusted.
pub(crate) fn display_name_cookie(
    username: &str,
    expires_at: DateTime<Utc>,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let expires = http_date(expires_at);
    with_secure(
        format!(
            "{USER_COOKIE}={username}; Path=/; Expires={expires}; Max-Age={max_age_seconds}; SameSite=Lax"
        ),
        secure,
    )
}

/// Build an already-expired cookie that makes the browser drop `name`.
pub(crate) fn expired_cookie(
    name: &str,
    http_only: bool,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let http_only = if http_only { " HttpOnly;" } else { "" };
    with_secure(
        format!(
            "{name}=; Path=/;{http_only} Expires={EXPIRED_HTTP_DATE}; Max-Age=0; SameSite=Lax"
        ),
        secure,
    )
}
