use crate::api::handlers::auth::MAX_SESSION_TTL_SECONDS;
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";
pub const ARG_ADMIN_USERNAME: &str = "admin-username";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";

#[derive(Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct Options {
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Options {
    /// Parse session and bootstrap admin arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session secret is missing, the TTL is not
    /// positive, or only one of the admin credentials is set.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // clap passes "" through when the env var is set but empty
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let session_secret = get_non_empty(ARG_SESSION_SECRET)
            .map(SecretString::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_SESSION_SECRET}"))?;

        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(604_800);
        if session_ttl_seconds <= 0 {
            anyhow::bail!("--{ARG_SESSION_TTL_SECONDS} must be greater than zero");
        }
        if session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            anyhow::bail!(
                "--{ARG_SESSION_TTL_SECONDS} must be at most {MAX_SESSION_TTL_SECONDS} (ten years)"
            );
        }

        let bootstrap_admin = match (
            get_non_empty(ARG_ADMIN_USERNAME),
            get_non_empty(ARG_ADMIN_PASSWORD),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                username,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "--{ARG_ADMIN_USERNAME} and --{ARG_ADMIN_PASSWORD} must be set together"
            ),
        };

        Ok(Self {
            session_secret,
            session_ttl_seconds,
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
            bootstrap_admin,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Secret used to sign session tokens (at least 32 bytes)")
                .env("FINANCE_SESSION_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds")
                .env("FINANCE_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark session cookies Secure (serve over HTTPS)")
                .env("FINANCE_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_ADMIN_USERNAME)
                .long(ARG_ADMIN_USERNAME)
                .help("Create this admin user at startup if it does not exist")
                .env("FINANCE_ADMIN_USERNAME")
                .requires(ARG_ADMIN_PASSWORD),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Password for the bootstrap admin user")
                .env("FINANCE_ADMIN_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_ADMIN_USERNAME),
        )
}
