use clap::{Arg, ArgAction, ArgMatches, Command, builder::FalseyValueParser};
use secrecy::SecretString;

pub const ARG_SECRET_CODE: &str = "secret-code";
pub const ARG_SESSION_KEY: &str = "session-key";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_MAX_ATTEMPTS: &str = "max-attempts";
pub const ARG_LOCKOUT_SECONDS: &str = "lockout-seconds";
pub const ARG_PRODUCTION: &str = "production";

#[derive(Debug)]
pub struct Options {
    pub secret_code: Option<SecretString>,
    pub session_key: Option<SecretString>,
    pub session_ttl_seconds: u64,
    pub max_attempts: u32,
    pub lockout_seconds: u64,
    pub production: bool,
}

impl Options {
    /// Parse access control arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a numeric argument is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Env vars set to "" come through as empty strings; treat them as unset.
        let get_secret = |id: &str| {
            matches
                .get_one::<String>(id)
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::from(v.clone()))
        };
        let get_number = |id: &str| {
            matches
                .get_one::<u64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            secret_code: get_secret(ARG_SECRET_CODE),
            session_key: get_secret(ARG_SESSION_KEY),
            session_ttl_seconds: get_number(ARG_SESSION_TTL_SECONDS)?,
            max_attempts: matches
                .get_one::<u32>(ARG_MAX_ATTEMPTS)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_MAX_ATTEMPTS}"))?,
            lockout_seconds: get_number(ARG_LOCKOUT_SECONDS)?,
            production: matches.get_flag(ARG_PRODUCTION),
        })
    }
}

pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    with_lockout_args(command)
}

fn with_secret_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_CODE)
                .long(ARG_SECRET_CODE)
                .help("Shared access code; without it every validation fails")
                .env("NOTEORA_SECRET_CODE")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_KEY)
                .long(ARG_SESSION_KEY)
                .help("Session encryption passphrase")
                .long_help(
                    "Session encryption passphrase. When unset a random key is generated at startup and sessions do not survive a restart.",
                )
                .env("NOTEORA_SESSION_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("NOTEORA_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_PRODUCTION)
                .long(ARG_PRODUCTION)
                .help("Mark session cookies Secure")
                .env("NOTEORA_PRODUCTION")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
}

fn with_lockout_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAX_ATTEMPTS)
                .long(ARG_MAX_ATTEMPTS)
                .help("Consecutive failures before a client is locked out")
                .env("NOTEORA_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_SECONDS)
                .long(ARG_LOCKOUT_SECONDS)
                .help("Lockout duration in seconds")
                .env("NOTEORA_LOCKOUT_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
