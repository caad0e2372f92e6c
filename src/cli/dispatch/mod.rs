//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action to run, currently only the API
//! server with its access control and record settings.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, auth, records};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);

    let auth_opts = auth::Options::parse(matches)?;
    let records_opts = records::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        secret_code: auth_opts.secret_code,
        session_key: auth_opts.session_key,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        max_attempts: auth_opts.max_attempts,
        lockout_seconds: auth_opts.lockout_seconds,
        production: auth_opts.production,
        records_file: records_opts.records_file,
        followup_contacts: records_opts.followup_contacts,
    }))
}
