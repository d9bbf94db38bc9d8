//! Route guard for pages that depend on (or must not see) a session.
//!
//! The guard inspects the session cookie, classifies the path against fixed
//! prefix lists, and either lets the request through or redirects. It does no
//! I/O and never validates the credential; the external API owns that.

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;

/// Cookie set by the current backend on login/signup.
pub const PRIMARY_COOKIE: &str = "token";
/// Session cookie of the legacy express-session backend.
pub const LEGACY_COOKIE: &str = "connect.sid";

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

const PROTECTED_PREFIXES: [&str; 1] = ["/dashboard"];
const AUTH_PREFIXES: [&str; 2] = ["/login", "/signup"];
const MATCHERS: [&str; 3] = ["/dashboard/:path*", "/login", "/signup"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("route prefix must start with '/': {0}")]
    InvalidPrefix(String),
    #[error("protected prefix {protected} overlaps auth-only prefix {auth_only}")]
    Overlap {
        protected: String,
        auth_only: String,
    },
}

/// A path pattern the guard is registered for.
///
/// `/dashboard/:path*` matches `/dashboard` and everything below it, any other
/// pattern matches the path exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Exact(String),
    Subtree(String),
}

impl Matcher {
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        match pattern.rfind("/:") {
            Some(index) if pattern.ends_with('*') => Self::Subtree(pattern[..index].to_string()),
            _ => Self::Exact(pattern.to_string()),
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Subtree(base) => path
                .strip_prefix(base.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// Immutable guard configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct RouteRules {
    protected: Vec<String>,
    auth_only: Vec<String>,
    matchers: Vec<Matcher>,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            protected: PROTECTED_PREFIXES.iter().map(ToString::to_string).collect(),
            auth_only: AUTH_PREFIXES.iter().map(ToString::to_string).collect(),
            matchers: MATCHERS.iter().map(|pattern| Matcher::parse(pattern)).collect(),
        }
    }
}

impl RouteRules {
    /// Build rules from explicit prefix lists and matcher patterns.
    ///
    /// # Errors
    /// Returns an error if a prefix is not absolute or if the protected and
    /// auth-only sets could classify the same path.
    pub fn new(protected: &[&str], auth_only: &[&str], matchers: &[&str]) -> Result<Self, RulesError> {
        for prefix in protected.iter().chain(auth_only) {
            if !prefix.starts_with('/') {
                return Err(RulesError::InvalidPrefix((*prefix).to_string()));
            }
        }

        for p in protected {
            for a in auth_only {
                if p.starts_with(a) || a.starts_with(p) {
                    return Err(RulesError::Overlap {
                        protected: (*p).to_string(),
                        auth_only: (*a).to_string(),
                    });
                }
            }
        }

        Ok(Self {
            protected: protected.iter().map(ToString::to_string).collect(),
            auth_only: auth_only.iter().map(ToString::to_string).collect(),
            matchers: matchers.iter().map(|pattern| Matcher::parse(pattern)).collect(),
        })
    }

    /// Whether the guard runs for this path at all.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.matches(path))
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.protected.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            RouteClass::Protected
        } else if self.auth_only.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Public
        }
    }

    #[must_use]
    pub fn decide(&self, path: &str, credential: Option<&Credential>) -> Decision {
        match (self.classify(path), credential.is_some()) {
            (RouteClass::Protected, false) => Decision::Redirect(LOGIN_PATH),
            (RouteClass::AuthOnly, true) => Decision::Redirect(DASHBOARD_PATH),
            _ => Decision::Allow,
        }
    }

    /// Full guard check for a request: matcher filter, cookie lookup, decision.
    #[must_use]
    pub fn check(&self, path: &str, headers: &HeaderMap) -> Decision {
        if !self.applies_to(path) {
            return Decision::Allow;
        }

        self.decide(path, credential(headers).as_ref())
    }
}

/// Opaque session credential read from a cookie.
#[derive(Debug, Clone)]
pub struct Credential {
    cookie: &'static str,
    value: SecretString,
}

impl Credential {
    /// Name of the cookie the credential was found under.
    #[must_use]
    pub const fn cookie(&self) -> &'static str {
        self.cookie
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

/// Look up the session credential, preferring the primary cookie over the
/// legacy one. Empty values count as absent.
#[must_use]
pub fn credential(headers: &HeaderMap) -> Option<Credential> {
    [PRIMARY_COOKIE, LEGACY_COOKIE].into_iter().find_map(|name| {
        cookie_value(headers, name).map(|value| Credential {
            cookie: name,
            value: SecretString::from(value),
        })
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            let value = value.trim();
            (key.trim() == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// `Set-Cookie` values expiring every session cookie the browser sent.
///
/// Used once the API has refused the credential, so the guard stops treating
/// the browser as signed in.
#[must_use]
pub fn expire_credentials(headers: &HeaderMap) -> Vec<HeaderValue> {
    [PRIMARY_COOKIE, LEGACY_COOKIE]
        .into_iter()
        .filter(|name| cookie_value(headers, name).is_some())
        .filter_map(|name| {
            HeaderValue::from_str(&format!(
                "{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
            ))
            .ok()
        })
        .collect()
}

/// axum middleware running [`RouteRules::check`] ahead of the page handlers.
pub async fn enforce(State(rules): State<Arc<RouteRules>>, request: Request, next: Next) -> Response {
    match rules.check(request.uri().path(), request.headers()) {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(target) => Redirect::to(target).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn protected_paths_redirect_without_credential() {
        let rules = RouteRules::default();
        for path in ["/dashboard", "/dashboard/", "/dashboard/new", "/dashboard/habits/1/log"] {
            assert_eq!(
                rules.check(path, &HeaderMap::new()),
                Decision::Redirect(LOGIN_PATH),
                "{path}"
            );
        }
    }

    #[test]
    fn protected_paths_allow_with_credential() {
        let rules = RouteRules::default();
        for cookie in ["token=abc", "connect.sid=s%3Axyz"] {
            assert_eq!(
                rules.check("/dashboard/new", &headers(&[cookie])),
                Decision::Allow
            );
        }
    }

    #[test]
    fn auth_paths_redirect_with_credential() {
        let rules = RouteRules::default();
        for path in ["/login", "/signup"] {
            assert_eq!(
                rules.check(path, &headers(&["token=abc"])),
                Decision::Redirect(DASHBOARD_PATH)
            );
            assert_eq!(rules.check(path, &HeaderMap::new()), Decision::Allow);
        }
    }

    #[test]
    fn auth_prefixed_paths_classify_as_auth_only() {
        let rules = RouteRules::default();
        assert_eq!(rules.classify("/login/help"), RouteClass::AuthOnly);
        assert_eq!(
            rules.decide("/signup/confirm", credential(&headers(&["token=abc"])).as_ref()),
            Decision::Redirect(DASHBOARD_PATH)
        );
    }

    #[test]
    fn public_paths_always_allowed() {
        let rules = RouteRules::default();
        for path in ["/", "/health", "/api/habits", "/favicon.ico", "/about"] {
            assert_eq!(rules.check(path, &HeaderMap::new()), Decision::Allow);
            assert_eq!(rules.check(path, &headers(&["token=abc"])), Decision::Allow);
            assert_eq!(rules.classify(path), RouteClass::Public);
        }
    }

    #[test]
    fn guard_only_runs_for_registered_matchers() {
        let rules = RouteRules::default();
        // Classified as protected by prefix, but outside every matcher.
        assert_eq!(rules.classify("/dashboards"), RouteClass::Protected);
        assert!(!rules.applies_to("/dashboards"));
        assert_eq!(rules.check("/dashboards", &HeaderMap::new()), Decision::Allow);
        assert!(!rules.applies_to("/login/extra"));
        assert!(rules.applies_to("/dashboard"));
        assert!(rules.applies_to("/dashboard/new"));
    }

    #[test]
    fn primary_cookie_wins_over_legacy() {
        let found = credential(&headers(&["connect.sid=legacy; token=primary"])).unwrap();
        assert_eq!(found.cookie(), PRIMARY_COOKIE);
        assert_eq!(found.expose(), "primary");

        let found = credential(&headers(&["connect.sid=legacy", "token=primary"])).unwrap();
        assert_eq!(found.expose(), "primary");
    }

    #[test]
    fn empty_primary_falls_back_to_legacy() {
        let found = credential(&headers(&["token=; connect.sid=legacy"])).unwrap();
        assert_eq!(found.cookie(), LEGACY_COOKIE);
        assert_eq!(found.expose(), "legacy");
    }

    #[test]
    fn malformed_cookies_count_as_unauthenticated() {
        assert!(credential(&headers(&["token"])).is_none());
        assert!(credential(&headers(&["tokenabc; ;="])).is_none());
        assert!(credential(&headers(&["other=1"])).is_none());

        let mut raw = HeaderMap::new();
        raw.insert(COOKIE, HeaderValue::from_bytes(b"token=\xff\xfe").unwrap());
        assert!(credential(&raw).is_none());
        assert_eq!(
            RouteRules::default().check("/dashboard", &raw),
            Decision::Redirect(LOGIN_PATH)
        );
    }

    #[test]
    fn credential_debug_does_not_leak_value() {
        let found = credential(&headers(&["token=super-secret"])).unwrap();
        assert!(!format!("{found:?}").contains("super-secret"));
    }

    #[test]
    fn matcher_parse() {
        assert_eq!(
            Matcher::parse("/dashboard/:path*"),
            Matcher::Subtree("/dashboard".to_string())
        );
        assert_eq!(Matcher::parse("/login"), Matcher::Exact("/login".to_string()));
        assert!(!Matcher::parse("/dashboard/:path*").matches("/dashboardx"));
    }

    #[test]
    fn rules_reject_overlapping_sets() {
        assert_eq!(
            RouteRules::new(&["/account"], &["/account/login"], &[]).unwrap_err(),
            RulesError::Overlap {
                protected: "/account".to_string(),
                auth_only: "/account/login".to_string(),
            }
        );
        assert_eq!(
            RouteRules::new(&["dashboard"], &["/login"], &[]).unwrap_err(),
            RulesError::InvalidPrefix("dashboard".to_string())
        );
        assert!(RouteRules::new(&PROTECTED_PREFIXES, &AUTH_PREFIXES, &MATCHERS).is_ok());
    }

    #[test]
    fn expire_credentials_only_touches_cookies_present() {
        assert!(expire_credentials(&HeaderMap::new()).is_empty());
        assert!(expire_credentials(&headers(&["theme=dark; token="])).is_empty());

        let expired = expire_credentials(&headers(&["token=abc", "connect.sid=s1"]));
        assert_eq!(
            expired,
            vec![
                HeaderValue::from_static("token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
                HeaderValue::from_static("connect.sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
            ]
        );
    }
}
