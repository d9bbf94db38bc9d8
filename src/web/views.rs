//! Server-rendered HTML for every page.
//!
//! Markup is plain. Pages are always rendered with controls idle; submit
//! buttons carry `data-pending-label` and the inline script swaps the label and
//! disables the button once its form is submitted. That script is the browser
//! half of a [`Control`]; the server half is the busy flag held by
//! [`crate::dispatch::Dispatcher`] for the duration of the API call.

use crate::{
    client::Habit,
    dispatch::{Action, Control},
    guard::{DASHBOARD_PATH, LOGIN_PATH},
    load::{LoadFailure, LoadOutcome},
};
use axum::response::Html;
use urlencoding::encode;

const TITLE: &str = "Mini Habit Tracker";

const PENDING_SCRIPT: &str = r#"<script>
document.addEventListener("submit", function (event) {
  var button = event.target.querySelector("button[data-pending-label]");
  if (button) {
    button.disabled = true;
    button.textContent = button.dataset.pendingLabel;
  }
});
</script>"#;

/// Inline error attached to one habit card after a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub habit_id: String,
    pub message: String,
}

#[must_use]
pub fn login_control() -> Control {
    Control::new("Log in", "Logging in...")
}

#[must_use]
pub fn signup_control() -> Control {
    Control::new("Create account", "Creating...")
}

#[must_use]
pub fn logout_control() -> Control {
    Control::new("Logout", "Logging out...")
}

#[must_use]
pub fn new_habit_control() -> Control {
    Control::new("Create Habit", "Creating...")
}

/// Control for a habit card button; the label matches the button that fired.
#[must_use]
pub fn habit_control(action: &Action) -> Control {
    match action {
        Action::UnlogHabit(_) => Control::new("Undo Today", "Saving..."),
        Action::DeleteHabit(_) => Control::new("Delete", "Deleting..."),
        _ => Control::new("Mark Today", "Saving..."),
    }
}

#[must_use]
pub fn home() -> Html<String> {
    layout(&format!(
        r#"<div class="hero">
<h1>{TITLE}</h1>
<p>Track your daily habits. Stay consistent. Improve every day.</p>
<p><a href="/signup">Sign up</a> <a href="{LOGIN_PATH}">Log in</a></p>
</div>"#
    ))
}

#[must_use]
pub fn login_page(email: &str, message: Option<&str>) -> Html<String> {
    auth_page("Log in", LOGIN_PATH, email, message, &login_control())
}

#[must_use]
pub fn signup_page(email: &str, message: Option<&str>) -> Html<String> {
    auth_page("Sign up", "/signup", email, message, &signup_control())
}

fn auth_page(
    heading: &str,
    action: &str,
    email: &str,
    message: Option<&str>,
    control: &Control,
) -> Html<String> {
    layout(&format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" class="card">
<input class="input" type="email" name="email" placeholder="Email" value="{email}">
<input class="input" type="password" name="password" placeholder="Password">
{button}
{error}
</form>"#,
        email = escape(email),
        button = submit_button(control, "btn"),
        error = error_line(message),
    ))
}

#[must_use]
pub fn new_habit_page(title: &str, message: Option<&str>) -> Html<String> {
    layout(&format!(
        r#"{nav}
<h1>New Habit</h1>
<form method="post" action="{DASHBOARD_PATH}/new" class="card">
<input class="input" type="text" name="title" placeholder="Habit title (e.g. Read 10 pages)" value="{title}" required>
<div class="row">
{button}
<a href="{DASHBOARD_PATH}" class="btn secondary">Cancel</a>
</div>
{error}
</form>"#,
        nav = navbar(),
        title = escape(title),
        button = submit_button(&new_habit_control(), "btn"),
        error = error_line(message),
    ))
}

#[must_use]
pub fn dashboard(outcome: &LoadOutcome<Vec<Habit>>, notice: Option<&Notice>) -> Html<String> {
    let content = match outcome {
        LoadOutcome::Unreachable(LoadFailure::Transport(_)) => {
            r#"<div class="card error">Unable to connect to the server. Please make sure the backend is running.</div>"#
                .to_string()
        }
        LoadOutcome::Unreachable(failure) => {
            let detail = match failure {
                LoadFailure::Status {
                    message: Some(message),
                    ..
                } => format!(" {}", escape(message)),
                _ => String::new(),
            };
            format!(r#"<div class="card error">Could not load your habits.{detail}</div>"#)
        }
        // The dashboard handler expires the stale session cookies on this
        // response, so the guard lets the login link through.
        LoadOutcome::Unauthorized => {
            format!(r#"<div class="card">You must log in. <a href="{LOGIN_PATH}">Login</a></div>"#)
        }
        LoadOutcome::Ready(habits) if habits.is_empty() => format!(
            r#"<h1>Your Habits</h1>
<div class="card">No habits yet. <a href="{DASHBOARD_PATH}/new">Create one</a></div>"#
        ),
        LoadOutcome::Ready(habits) => {
            let mut cards = String::from("<h1>Your Habits</h1>\n");
            for habit in habits {
                let notice = notice.filter(|notice| notice.habit_id == habit.id);
                cards.push_str(&habit_card(habit, notice));
            }
            cards
        }
    };

    layout(&format!("{}\n{content}", navbar()))
}

/// Shown when logging out fails; the session is left as it was.
#[must_use]
pub fn logout_failed(message: &str) -> Html<String> {
    layout(&format!(
        r#"{nav}
<div class="card">
<p class="error">{message}</p>
<a href="{DASHBOARD_PATH}">Back to your habits</a>
</div>"#,
        nav = navbar(),
        message = escape(message),
    ))
}

fn habit_card(habit: &Habit, notice: Option<&Notice>) -> String {
    let base = format!("{DASHBOARD_PATH}/habits/{}", encode(&habit.id));
    let toggle = if habit.today_logged {
        let control = habit_control(&Action::UnlogHabit(habit.id.clone()));
        action_form(&format!("{base}/unlog"), &control, "btn done")
    } else {
        let control = habit_control(&Action::LogHabit(habit.id.clone()));
        action_form(&format!("{base}/log"), &control, "btn")
    };
    let delete = action_form(
        &format!("{base}/delete"),
        &habit_control(&Action::DeleteHabit(habit.id.clone())),
        "btn danger",
    );

    let mut card = format!(
        r#"<div class="card habit" data-habit-id="{id}">
<h3>{title}</h3>
<p class="stats">Total: {total} &mdash; Streak: {streak}</p>
<div class="row">{toggle}{delete}</div>
"#,
        id = escape(&habit.id),
        title = escape(&habit.title),
        total = habit.total_logs,
        streak = habit.current_streak,
    );
    if let Some(notice) = notice {
        card.push_str(&error_line(Some(notice.message.as_str())));
        card.push('\n');
    }
    card.push_str("</div>\n");
    card
}

fn navbar() -> String {
    format!(
        r#"<nav>
<a href="{DASHBOARD_PATH}">Habit Tracker</a>
<div class="row">
<a href="{DASHBOARD_PATH}/new">+ New</a>
{logout}
</div>
</nav>"#,
        logout = action_form("/logout", &logout_control(), "btn danger"),
    )
}

fn action_form(action: &str, control: &Control, class: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="inline">{}</form>"#,
        submit_button(control, class)
    )
}

fn submit_button(control: &Control, class: &str) -> String {
    format!(
        r#"<button type="submit" class="{class}" data-pending-label="{pending}">{label}</button>"#,
        pending = escape(control.pending_label()),
        label = escape(control.idle_label()),
    )
}

fn error_line(message: Option<&str>) -> String {
    message
        .filter(|message| !message.is_empty())
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .unwrap_or_default()
}

fn layout(body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{TITLE}</title>
</head>
<body>
<div class="container">
{body}
</div>
{PENDING_SCRIPT}
</body>
</html>
"#
    ))
}

/// Escape text for HTML element content and double-quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit(id: &str, today_logged: bool) -> Habit {
        Habit {
            id: id.to_string(),
            title: "Read <10> pages".to_string(),
            total_logs: 4,
            current_streak: 2,
            today_logged,
        }
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn card_actions_encode_the_habit_id() {
        let page = dashboard(&LoadOutcome::Ready(vec![habit("a b/c", false)]), None).0;

        assert!(page.contains(r#"action="/dashboard/habits/a%20b%2Fc/log""#));
        assert!(page.contains(r#"action="/dashboard/habits/a%20b%2Fc/delete""#));
        assert!(page.contains(r#"data-habit-id="a b/c""#));
    }

    #[test]
    fn dashboard_states_are_distinct() {
        let unreachable = dashboard(
            &LoadOutcome::Unreachable(LoadFailure::Transport("down".into())),
            None,
        )
        .0;
        let unauthorized = dashboard(&LoadOutcome::Unauthorized, None).0;
        let empty = dashboard(&LoadOutcome::Ready(Vec::new()), None).0;

        assert!(unreachable.contains("Unable to connect to the server"));
        assert!(!unreachable.contains("You must log in"));
        assert!(unauthorized.contains("You must log in"));
        assert!(!unauthorized.contains("No habits yet"));
        assert!(empty.contains("No habits yet"));
        assert!(!empty.contains("You must log in"));
    }

    #[test]
    fn http_error_is_not_reported_as_connectivity() {
        let failed = dashboard(
            &LoadOutcome::Unreachable(LoadFailure::Status {
                status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                message: Some("db <down>".to_string()),
            }),
            None,
        )
        .0;
        assert!(failed.contains("Could not load your habits. db &lt;down&gt;"));
        assert!(!failed.contains("backend is running"));

        let garbled = dashboard(&LoadOutcome::Unreachable(LoadFailure::Decode("eof".into())), None).0;
        assert!(garbled.contains("Could not load your habits."));
        assert!(!garbled.contains("eof"));
        assert!(!garbled.contains("backend is running"));
    }

    #[test]
    fn habit_card_toggles_on_today_logged() {
        let page = dashboard(&LoadOutcome::Ready(vec![habit("1", false), habit("2", true)]), None).0;

        assert!(page.contains(r#"action="/dashboard/habits/1/log""#));
        assert!(page.contains(r#"action="/dashboard/habits/2/unlog""#));
        assert!(page.contains(r#"action="/dashboard/habits/2/delete""#));
        assert!(page.contains("Mark Today"));
        assert!(page.contains("Undo Today"));
        assert!(page.contains("Read &lt;10&gt; pages"));
        assert!(page.contains("Total: 4 &mdash; Streak: 2"));
    }

    #[test]
    fn notice_renders_only_on_matching_card() {
        let notice = Notice {
            habit_id: "2".to_string(),
            message: "Already logged".to_string(),
        };
        let page = dashboard(
            &LoadOutcome::Ready(vec![habit("1", false), habit("2", false)]),
            Some(&notice),
        )
        .0;

        assert_eq!(page.matches("Already logged").count(), 1);
        let card_two = page.split(r#"data-habit-id="2""#).nth(1).unwrap();
        assert!(card_two.contains("Already logged"));
    }

    #[test]
    fn forms_expose_pending_labels() {
        let page = login_page("me@example.com", Some("Invalid credentials")).0;
        assert!(page.contains(r#"data-pending-label="Logging in...""#));
        assert!(page.contains(">Log in</button>"));
        assert!(page.contains(r#"value="me@example.com""#));
        assert!(page.contains(r#"<p class="error">Invalid credentials</p>"#));

        assert!(!page.contains("disabled>"));

        let page = signup_page("", None).0;
        assert!(page.contains(r#"data-pending-label="Creating...""#));
        assert!(!page.contains(r#"class="error""#));
    }

    #[test]
    fn new_habit_page_keeps_title_and_message() {
        let page = new_habit_page("Run \"5k\"", Some("Failed to create habit")).0;
        assert!(page.contains(r#"value="Run &quot;5k&quot;""#));
        assert!(page.contains("Failed to create habit"));
        assert!(page.contains(r#"action="/logout""#));
    }
}
