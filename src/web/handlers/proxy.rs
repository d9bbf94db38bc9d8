//! `/api/*` pass-through so browser code can talk to the API same-origin.

use crate::client::{cookie_header, ApiClient};
use axum::{
    body::Bytes,
    extract::Extension,
    http::{
        header::{CONTENT_TYPE, LOCATION, SET_COOKIE},
        HeaderMap, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

const API_PREFIX: &str = "/api";

pub async fn forward(
    Extension(api): Extension<Arc<ApiClient>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path());
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let result = api
        .forward(
            method,
            &path_and_query,
            headers.get(CONTENT_TYPE),
            cookie_header(&headers).as_ref(),
            body,
        )
        .await;

    match result {
        Ok(upstream) => {
            let mut response = (upstream.status, upstream.body).into_response();
            let response_headers = response.headers_mut();
            match upstream.content_type {
                Some(content_type) => {
                    response_headers.insert(CONTENT_TYPE, content_type);
                }
                None => {
                    response_headers.remove(CONTENT_TYPE);
                }
            }
            if let Some(location) = upstream.location {
                response_headers.insert(LOCATION, location);
            }
            for cookie in upstream.set_cookies {
                response_headers.append(SET_COOKIE, cookie);
            }
            response
        }
        Err(err) if err.is_unreachable() => {
            warn!("API unreachable: {err}");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": "Unable to connect to the server." })),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to forward request: {err}");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid API path." })),
            )
                .into_response()
        }
    }
}
