//! Login, signup and logout: render the form, dispatch the action, then
//! navigate or re-render with the API's message.

use super::{error_status, see_other};
use crate::{
    client::{cookie_header, Credentials},
    dispatch::{Action, Dispatcher, Outcome, UNREACHABLE_MESSAGE},
    guard::LOGIN_PATH,
    web::views,
};
use axum::{
    extract::{Extension, Form},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login_page() -> Html<String> {
    views::login_page("", None)
}

pub async fn signup_page() -> Html<String> {
    views::signup_page("", None)
}

pub async fn login(
    Extension(dispatcher): Extension<Dispatcher>,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let email = form.email.trim().to_string();
    let action = Action::Login(Credentials::new(email.clone(), form.password));
    let outcome = dispatcher
        .dispatch(
            &views::login_control(),
            &action,
            cookie_header(&headers).as_ref(),
        )
        .await;

    respond(outcome, |status, message| {
        (status, views::login_page(&email, Some(message))).into_response()
    })
}

pub async fn signup(
    Extension(dispatcher): Extension<Dispatcher>,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let email = form.email.trim().to_string();
    let action = Action::Signup(Credentials::new(email.clone(), form.password));
    let outcome = dispatcher
        .dispatch(
            &views::signup_control(),
            &action,
            cookie_header(&headers).as_ref(),
        )
        .await;

    respond(outcome, |status, message| {
        (status, views::signup_page(&email, Some(message))).into_response()
    })
}

pub async fn logout(Extension(dispatcher): Extension<Dispatcher>, headers: HeaderMap) -> Response {
    let outcome = dispatcher
        .dispatch(
            &views::logout_control(),
            &Action::Logout,
            cookie_header(&headers).as_ref(),
        )
        .await;

    respond(outcome, |status, message| {
        (status, views::logout_failed(message)).into_response()
    })
}

fn respond(outcome: Outcome, render: impl FnOnce(StatusCode, &str) -> Response) -> Response {
    match outcome {
        Outcome::Navigate { to, set_cookies } => see_other(to, set_cookies),
        // Auth actions only navigate.
        Outcome::Refresh { set_cookies } => see_other(LOGIN_PATH, set_cookies),
        Outcome::Rejected { status, message } => render(error_status(status), &message),
        Outcome::Unreachable { .. } => render(StatusCode::BAD_GATEWAY, UNREACHABLE_MESSAGE),
    }
}
