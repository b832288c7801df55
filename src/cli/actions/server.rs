use crate::{
    api::{self, ServerConfig, handlers::auth::AuthConfig},
    cli::commands::auth::BootstrapAdmin,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub web_dir: PathBuf,
    pub request_timeout_seconds: u64,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the session config is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_config = AuthConfig::new(args.session_secret)
        .context("Invalid session configuration")?
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .context("Invalid session configuration")?
        .with_secure_cookies(args.secure_cookies);

    let config = ServerConfig {
        port: args.port,
        dsn: args.dsn,
        web_dir: args.web_dir,
        request_timeout: Duration::from_secs(args.request_timeout_seconds),
        bootstrap_admin: args
            .bootstrap_admin
            .map(|admin| (admin.username, admin.password)),
    };

    api::new(config, auth_config).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", args.dsn.clone()),
        ("web_dir", args.web_dir.display().to_string()),
        (
            "request_timeout",
            format!("{}s", args.request_timeout_seconds),
        ),
        ("session_ttl", format!("{}s", args.session_ttl_seconds)),
        ("secure_cookies", args.secure_cookies.to_string()),
        (
            "bootstrap_admin",
            args.bootstrap_admin
                .as_ref()
                .map_or_else(|| "none".to_string(), |admin| admin.username.clone()),
        ),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        message.push_str(&format!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn banner() -> String {
    format!(
        "finance {} - {}",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
