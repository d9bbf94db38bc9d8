//! Maps validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::api;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(3000);
    let api_opts = api::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        api_base_url: api_opts.base_url,
        api_timeout_seconds: api_opts.timeout_seconds,
    }))
}
