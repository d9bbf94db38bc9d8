use crate::{client::ApiClient, guard::RouteRules, web};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub api_base_url: String,
    pub api_timeout_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the API client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let api = ApiClient::new(
        &args.api_base_url,
        Duration::from_secs(args.api_timeout_seconds),
    )
    .context("Failed to build API client")?;

    let rules = RouteRules::default();

    debug!("Route rules: {:?}", rules);
    debug!("API base URL: {}", api.base_url());

    web::new(args.port, Arc::new(api), Arc::new(rules)).await
}
