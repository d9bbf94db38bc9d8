use super::{error_status, see_other};
use crate::{
    client::{cookie_header, ApiClient, Habit, NewHabit},
    dispatch::{Action, Dispatcher, Outcome, UNREACHABLE_MESSAGE},
    guard::{self, DASHBOARD_PATH},
    load::{load_habits, LoadFailure, LoadOutcome},
    web::views::{self, Notice},
};
use axum::{
    extract::{Extension, Form, Path},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct NewHabitForm {
    #[serde(default)]
    title: String,
}

pub async fn dashboard(Extension(api): Extension<Arc<ApiClient>>, headers: HeaderMap) -> Response {
    let outcome = load_habits(&api, cookie_header(&headers).as_ref()).await;
    render(StatusCode::OK, &outcome, None, &headers)
}

pub async fn new_page() -> Html<String> {
    views::new_habit_page("", None)
}

pub async fn create(
    Extension(dispatcher): Extension<Dispatcher>,
    headers: HeaderMap,
    Form(form): Form<NewHabitForm>,
) -> Response {
    let title = form.title.trim().to_string();
    let action = Action::CreateHabit(NewHabit {
        title: title.clone(),
    });
    let outcome = dispatcher
        .dispatch(
            &views::new_habit_control(),
            &action,
            cookie_header(&headers).as_ref(),
        )
        .await;

    match outcome {
        Outcome::Navigate { to, set_cookies } => see_other(to, set_cookies),
        Outcome::Refresh { set_cookies } => see_other(DASHBOARD_PATH, set_cookies),
        Outcome::Rejected { status, message } => (
            error_status(status),
            views::new_habit_page(&title, Some(message.as_str())),
        )
            .into_response(),
        Outcome::Unreachable { .. } => (
            StatusCode::BAD_GATEWAY,
            views::new_habit_page(&title, Some(UNREACHABLE_MESSAGE)),
        )
            .into_response(),
    }
}

pub async fn log(
    Extension(dispatcher): Extension<Dispatcher>,
    Extension(api): Extension<Arc<ApiClient>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    habit_action(&dispatcher, &api, &headers, Action::LogHabit(id)).await
}

pub async fn unlog(
    Extension(dispatcher): Extension<Dispatcher>,
    Extension(api): Extension<Arc<ApiClient>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    habit_action(&dispatcher, &api, &headers, Action::UnlogHabit(id)).await
}

pub async fn delete(
    Extension(dispatcher): Extension<Dispatcher>,
    Extension(api): Extension<Arc<ApiClient>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    habit_action(&dispatcher, &api, &headers, Action::DeleteHabit(id)).await
}

/// Run a habit card action; success refreshes the list, failure re-renders it
/// with the message under the card that fired.
async fn habit_action(
    dispatcher: &Dispatcher,
    api: &ApiClient,
    headers: &HeaderMap,
    action: Action,
) -> Response {
    let cookies = cookie_header(headers);
    let outcome = dispatcher
        .dispatch(&views::habit_control(&action), &action, cookies.as_ref())
        .await;

    let (status, message) = match outcome {
        Outcome::Navigate { to, set_cookies } => return see_other(to, set_cookies),
        Outcome::Refresh { set_cookies } => return see_other(DASHBOARD_PATH, set_cookies),
        Outcome::Rejected { status, message } => (error_status(status), message),
        Outcome::Unreachable { .. } => (StatusCode::BAD_GATEWAY, UNREACHABLE_MESSAGE.to_string()),
    };

    let notice = Notice {
        habit_id: habit_id(&action).to_string(),
        message,
    };
    let outcome = load_habits(api, cookies.as_ref()).await;
    render(status, &outcome, Some(&notice), headers)
}

/// Render the list; a failed read overrides `status`, and a refused
/// credential is expired so the login link is not redirected back here.
fn render(
    status: StatusCode,
    outcome: &LoadOutcome<Vec<Habit>>,
    notice: Option<&Notice>,
    headers: &HeaderMap,
) -> Response {
    let status = match outcome {
        LoadOutcome::Unreachable(LoadFailure::Transport(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LoadOutcome::Unreachable(LoadFailure::Status { status, .. }) => error_status(*status),
        LoadOutcome::Unreachable(LoadFailure::Decode(_)) => StatusCode::BAD_GATEWAY,
        _ => status,
    };
    let mut response = (status, views::dashboard(outcome, notice)).into_response();
    if matches!(outcome, LoadOutcome::Unauthorized) {
        for cookie in guard::expire_credentials(headers) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    response
}

fn habit_id(action: &Action) -> &str {
    match action {
        Action::LogHabit(id) | Action::UnlogHabit(id) | Action::DeleteHabit(id) => id.as_str(),
        _ => "",
    }
}
