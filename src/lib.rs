//! # Mini Habit Tracker (web frontend)
//!
//! `habit-tracker` serves the pages of the habit tracker (landing, signup,
//! login, dashboard, new habit) and delegates every bit of state to a remote
//! HTTP API. Nothing is stored locally.
//!
//! ## Route Guard
//!
//! Every request matching `/dashboard/:path*`, `/login` or `/signup` passes
//! through [`guard::enforce`] before any page logic runs. The guard only looks
//! at whether a session cookie (`token`, falling back to the legacy
//! `connect.sid`) is present; it never validates it. Validation is the API's job.
//!
//! ## Actions
//!
//! Mutations (login, signup, logout, create/log/unlog/delete habit) go through
//! [`dispatch::Dispatcher`], which forwards the browser's cookies, relays any
//! `Set-Cookie` headers back, and turns the API's answer into a navigation, a
//! refresh, an inline message, or an "unreachable" state.
//!
//! ## Page Reads
//!
//! Pages that show remote data use [`load::load_habits`], which always resolves
//! to exactly one of ready, unauthorized or unreachable.

pub mod cli;
pub mod client;
pub mod dispatch;
pub mod guard;
pub mod load;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
