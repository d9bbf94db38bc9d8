use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_API_TIMEOUT: &str = "api-timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long(ARG_API_BASE_URL)
                .help("Base URL of the habit API, example: http://localhost:4000")
                .env("HABITS_API_BASE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_TIMEOUT)
                .long(ARG_API_TIMEOUT)
                .help("Timeout in seconds for requests to the habit API")
                .default_value("10")
                .env("HABITS_API_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Options {
    /// Read and validate the API options.
    ///
    /// # Errors
    /// Returns an error if the base URL is missing or not an absolute http(s) URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let base_url = matches
            .get_one::<String>(ARG_API_BASE_URL)
            .cloned()
            .context("missing required argument: --api-base-url")?;

        let parsed = Url::parse(&base_url)
            .with_context(|| format!("Invalid API base URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use http or https: {base_url}");
        }

        Ok(Self {
            base_url,
            timeout_seconds: matches.get_one::<u64>(ARG_API_TIMEOUT).copied().unwrap_or(10),
        })
    }
}
