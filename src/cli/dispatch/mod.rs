//! Command-line argument dispatch.
//!
//! Parses validated CLI arguments and maps them to an action, such as starting
//! the HTTP server with its session and storage configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{
    ARG_DSN, ARG_PORT, ARG_REQUEST_TIMEOUT_SECONDS, ARG_WEB_DIR, auth,
};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let web_dir = matches
        .get_one::<String>(ARG_WEB_DIR)
        .map(PathBuf::from)
        .context("missing required argument: --web-dir")?;
    let request_timeout_seconds = matches
        .get_one::<u64>(ARG_REQUEST_TIMEOUT_SECONDS)
        .copied()
        .unwrap_or(30);

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        web_dir,
        request_timeout_seconds,
        session_secret: auth_opts.session_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        secure_cookies: auth_opts.secure_cookies,
        bootstrap_admin: auth_opts.bootstrap_admin,
    }))
}
