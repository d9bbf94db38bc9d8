use crate::{client::ApiClient, dispatch::Dispatcher, guard, guard::RouteRules};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{any, get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
pub mod views;

use handlers::{auth, dashboard, health, home, proxy};

/// Build the frontend router: pages, actions, health and the API pass-through,
/// with the route guard in front of all of them.
#[must_use]
pub fn router(api: Arc<ApiClient>, rules: Arc<RouteRules>) -> Router {
    let dispatcher = Dispatcher::new(api.clone());

    Router::new()
        .route("/", get(home))
        .route("/health", get(health::health).options(health::health))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/dashboard/new",
            get(dashboard::new_page).post(dashboard::create),
        )
        .route("/dashboard/habits/:id/log", post(dashboard::log))
        .route("/dashboard/habits/:id/unlog", post(dashboard::unlog))
        .route("/dashboard/habits/:id/delete", post(dashboard::delete))
        .route("/api/*path", any(proxy::forward))
        .layer(middleware::from_fn_with_state(rules, guard::enforce))
        .layer(Extension(dispatcher))
        .layer(Extension(api))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, api: Arc<ApiClient>, rules: Arc<RouteRules>) -> Result<()> {
    let app = router(api, rules).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
