pub mod auth;
pub mod dashboard;
pub mod health;
pub mod proxy;

use crate::web::views;
use axum::{
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};

// common functions for the handlers

/// `303 See Other` to `to`, carrying the cookies the API set.
pub(crate) fn see_other(to: &str, set_cookies: Vec<HeaderValue>) -> Response {
    let mut response = Redirect::to(to).into_response();
    for cookie in set_cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// Status used when re-rendering a page with an inline error.
///
/// Upstream 4xx/5xx pass through; an unexpected 1xx/2xx/3xx means the API did
/// not answer the way the flow requires.
pub(crate) fn error_status(status: StatusCode) -> StatusCode {
    if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::BAD_GATEWAY
    }
}

pub async fn home() -> Html<String> {
    views::home()
}
