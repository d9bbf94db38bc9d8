//! Uniform execution of user-triggered mutations.
//!
//! Each [`Action`] knows its endpoint, verb, body, what counts as success and
//! what happens next. [`Dispatcher::dispatch`] marks the triggering [`Control`]
//! pending for the lifetime of the call and classifies the API's answer into an
//! [`Outcome`].

use crate::{
    client::{ApiClient, ApiResponse, Credentials, NewHabit},
    guard::{DASHBOARD_PATH, LOGIN_PATH},
};
use reqwest::{header::HeaderValue, Method, StatusCode};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, instrument, warn};

const REQUEST_FAILED: &str = "Request failed.";
const CREATE_HABIT_FAILED: &str = "Failed to create habit";
pub const UNREACHABLE_MESSAGE: &str =
    "Unable to connect to the server. Please make sure the backend is running.";

#[derive(Debug, Clone)]
pub enum Action {
    Login(Credentials),
    Signup(Credentials),
    Logout,
    CreateHabit(NewHabit),
    LogHabit(String),
    UnlogHabit(String),
    DeleteHabit(String),
}

/// What the page does after a successful action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnSuccess {
    Navigate(&'static str),
    Refresh,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Go to another page, relaying any cookies the API set.
    Navigate {
        to: &'static str,
        set_cookies: Vec<HeaderValue>,
    },
    /// Re-fetch the current view.
    Refresh { set_cookies: Vec<HeaderValue> },
    /// The API answered but refused; show `message` next to the control.
    Rejected { status: StatusCode, message: String },
    /// No answer at all.
    Unreachable { reason: String },
}

impl Action {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Signup(_) => "signup",
            Self::Logout => "logout",
            Self::CreateHabit(_) => "create_habit",
            Self::LogHabit(_) => "log_habit",
            Self::UnlogHabit(_) => "unlog_habit",
            Self::DeleteHabit(_) => "delete_habit",
        }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::DeleteHabit(_) => Method::DELETE,
            _ => Method::POST,
        }
    }

    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::Login(_) => vec!["auth", "login"],
            Self::Signup(_) => vec!["auth", "signup"],
            Self::Logout => vec!["auth", "logout"],
            Self::CreateHabit(_) => vec!["habits"],
            Self::LogHabit(id) => vec!["habits", id.as_str(), "log"],
            Self::UnlogHabit(id) => vec!["habits", id.as_str(), "unlog"],
            Self::DeleteHabit(id) => vec!["habits", id.as_str()],
        }
    }

    #[must_use]
    pub fn body(&self) -> Option<Value> {
        match self {
            Self::Login(credentials) | Self::Signup(credentials) => Some(credentials.to_json()),
            Self::CreateHabit(habit) => Some(json!({ "title": habit.title })),
            _ => None,
        }
    }

    /// Signup only succeeds on `201 Created`, everything else on any 2xx.
    #[must_use]
    pub fn succeeded(&self, status: StatusCode) -> bool {
        match self {
            Self::Signup(_) => status == StatusCode::CREATED,
            _ => status.is_success(),
        }
    }

    #[must_use]
    pub const fn on_success(&self) -> OnSuccess {
        match self {
            Self::Login(_) | Self::CreateHabit(_) => OnSuccess::Navigate(DASHBOARD_PATH),
            Self::Signup(_) | Self::Logout => OnSuccess::Navigate(LOGIN_PATH),
            Self::LogHabit(_) | Self::UnlogHabit(_) | Self::DeleteHabit(_) => OnSuccess::Refresh,
        }
    }

    const fn fallback_message(&self) -> &'static str {
        match self {
            Self::CreateHabit(_) => CREATE_HABIT_FAILED,
            _ => REQUEST_FAILED,
        }
    }
}

/// A button or form submit whose state follows an in-flight action.
#[derive(Debug, Clone)]
pub struct Control {
    label: &'static str,
    pending_label: &'static str,
    busy: Arc<AtomicBool>,
}

impl Control {
    #[must_use]
    pub fn new(label: &'static str, pending_label: &'static str) -> Self {
        Self {
            label,
            pending_label,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Label to render right now.
    #[must_use]
    pub fn label(&self) -> &'static str {
        if self.is_pending() {
            self.pending_label
        } else {
            self.label
        }
    }

    #[must_use]
    pub const fn idle_label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub const fn pending_label(&self) -> &'static str {
        self.pending_label
    }

    fn begin(&self) -> Pending<'_> {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!(control = self.label, "control already pending");
        }
        Pending(self)
    }
}

/// Clears the busy flag however the dispatch ends.
struct Pending<'a>(&'a Control);

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    api: Arc<ApiClient>,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Run `action` against the API with the browser's cookies forwarded.
    #[instrument(skip_all, fields(action = action.name()))]
    pub async fn dispatch(
        &self,
        control: &Control,
        action: &Action,
        cookies: Option<&HeaderValue>,
    ) -> Outcome {
        let _pending = control.begin();

        let body = action.body();
        let result = self
            .api
            .send_json(action.method(), &action.segments(), body.as_ref(), cookies)
            .await;

        match result {
            Ok(response) => classify(action, response),
            Err(err) if err.is_unreachable() => {
                warn!("API unreachable: {err}");
                Outcome::Unreachable {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                warn!("Action could not be sent: {err}");
                Outcome::Rejected {
                    status: StatusCode::BAD_REQUEST,
                    message: action.fallback_message().to_string(),
                }
            }
        }
    }
}

fn classify(action: &Action, response: ApiResponse) -> Outcome {
    if action.succeeded(response.status) {
        debug!(status = %response.status, "action succeeded");
        return match action.on_success() {
            OnSuccess::Navigate(to) => Outcome::Navigate {
                to,
                set_cookies: response.set_cookies,
            },
            OnSuccess::Refresh => Outcome::Refresh {
                set_cookies: response.set_cookies,
            },
        };
    }

    debug!(status = %response.status, "action rejected");
    Outcome::Rejected {
        status: response.status,
        message: response
            .message()
            .unwrap_or_else(|| action.fallback_message().to_string()),
    }
}
