//! HTTP client for the external habit API.
//!
//! Every call forwards the browser's cookies and hands back the raw status,
//! `Set-Cookie` headers and body so callers decide how to classify the answer.
//! The only error that means "no answer" is [`ApiError::Unreachable`].

pub mod error;
pub mod types;

pub use self::error::ApiError;
pub use self::types::{Credentials, ErrorBody, Habit, NewHabit};

use crate::APP_USER_AGENT;
use axum::body::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    redirect, Client, Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default request timeout applied to every API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error message characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: Client,
}

/// Everything the frontend needs from an API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    /// Redirect target; redirects are never followed by the client.
    pub location: Option<HeaderValue>,
    pub set_cookies: Vec<HeaderValue>,
    pub body: Bytes,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The `message` field of a JSON error body, trimmed and truncated.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let body: ErrorBody = serde_json::from_slice(&self.body).ok()?;
        let message = body.message?;
        let trimmed = message.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
        }
    }
}

impl ApiClient {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute http(s) URL or the
    /// underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim())
            .map_err(|err| ApiError::InvalidBaseUrl(format!("{base_url}: {err}")))?;

        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        // Redirects are relayed to the browser, never followed here.
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { base, http })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// # Errors
    /// Returns an error if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Join an already-encoded path (and optional query) onto the base URL.
    ///
    /// # Errors
    /// Returns an error if the result is not a valid URL.
    pub fn raw_url(&self, path_and_query: &str) -> Result<Url, ApiError> {
        let base = self.base.as_str().trim_end_matches('/');
        let path = path_and_query.trim().trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|err| ApiError::InvalidBaseUrl(format!("{base}/{path}: {err}")))
    }

    /// Send a request with an optional JSON body.
    ///
    /// # Errors
    /// Returns [`ApiError::Unreachable`] when no response arrives.
    #[instrument(skip(self, body, cookies), fields(http.method = %method))]
    pub async fn send_json(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
        cookies: Option<&HeaderValue>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(segments)?;
        let mut request = self.request(method, url, cookies);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request).await
    }

    /// Forward an arbitrary request body verbatim.
    ///
    /// # Errors
    /// Returns [`ApiError::Unreachable`] when no response arrives.
    #[instrument(skip(self, content_type, cookies, body), fields(http.method = %method))]
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        content_type: Option<&HeaderValue>,
        cookies: Option<&HeaderValue>,
        body: Bytes,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.raw_url(path_and_query)?;
        let mut request = self.request(method, url, cookies);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type.clone());
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        self.execute(request).await
    }

    /// `GET /habits`
    ///
    /// # Errors
    /// Returns [`ApiError::Unreachable`] when no response arrives.
    pub async fn habits(&self, cookies: Option<&HeaderValue>) -> Result<ApiResponse, ApiError> {
        self.send_json(Method::GET, &["habits"], None, cookies).await
    }

    /// Any HTTP answer from the base URL counts as reachable.
    ///
    /// # Errors
    /// Returns [`ApiError::Unreachable`] when no response arrives.
    pub async fn ping(&self) -> Result<StatusCode, ApiError> {
        let response = self
            .http
            .get(self.base.clone())
            .send()
            .await
            .map_err(ApiError::Unreachable)?;
        Ok(response.status())
    }

    fn request(&self, method: Method, url: Url, cookies: Option<&HeaderValue>) -> RequestBuilder {
        let request = self.http.request(method, url);
        match cookies {
            Some(cookies) => request.header(COOKIE, cookies.clone()),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = request.send().await.map_err(ApiError::Unreachable)?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let location = response.headers().get(LOCATION).cloned();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .cloned()
            .collect();
        let body = response.bytes().await.map_err(ApiError::Unreachable)?;

        debug!(%status, "API responded");

        Ok(ApiResponse {
            status,
            content_type,
            location,
            set_cookies,
            body,
        })
    }
}

/// Collapse the browser's `Cookie` headers into one value for forwarding.
#[must_use]
pub fn cookie_header(headers: &HeaderMap) -> Option<HeaderValue> {
    let values: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        HeaderValue::from_str(&values.join("; ")).ok()
    }
}
