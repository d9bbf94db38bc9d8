//! Page-level reads of remote data.

use crate::client::{ApiClient, Habit};
use reqwest::{header::HeaderValue, StatusCode};
use tracing::{instrument, warn};

/// Result of loading the data a page depends on. Every fetch ends in exactly
/// one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Ready(T),
    /// The API answered 401.
    Unauthorized,
    /// The data could not be obtained.
    Unreachable(LoadFailure),
}

/// Why a read produced no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// No HTTP response at all.
    Transport(String),
    /// The API answered with an error status other than 401.
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    /// The API answered 2xx with a body that is not the expected shape.
    Decode(String),
}

impl LoadFailure {
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl<T> LoadOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadOutcome<U> {
        match self {
            Self::Ready(value) => LoadOutcome::Ready(f(value)),
            Self::Unauthorized => LoadOutcome::Unauthorized,
            Self::Unreachable(failure) => LoadOutcome::Unreachable(failure),
        }
    }
}

/// Fetch the current user's habits in API order.
#[instrument(skip_all)]
pub async fn load_habits(api: &ApiClient, cookies: Option<&HeaderValue>) -> LoadOutcome<Vec<Habit>> {
    let response = match api.habits(cookies).await {
        Ok(response) => response,
        Err(err) => {
            warn!("Failed to load habits: {err}");
            return LoadOutcome::Unreachable(LoadFailure::Transport(err.to_string()));
        }
    };

    if response.status == StatusCode::UNAUTHORIZED {
        return LoadOutcome::Unauthorized;
    }

    if !response.is_success() {
        warn!(status = %response.status, "Unexpected status loading habits");
        return LoadOutcome::Unreachable(LoadFailure::Status {
            status: response.status,
            message: response.message(),
        });
    }

    match response.json::<Vec<Habit>>() {
        Ok(habits) => LoadOutcome::Ready(habits),
        Err(err) => {
            warn!("Failed to decode habits: {err}");
            LoadOutcome::Unreachable(LoadFailure::Decode(err.to_string()))
        }
    }
}
