//! The HTTP transport: routing, middleware and JSON rendering on top of the stores.
//!
//! Every route lives under `/v1` and requires a known bearer token. Mutating routes additionally
//! take the `Admin` extractor.

mod bills;
mod categories;
mod charts;
mod middleware;

use crate::auth::{Authenticator, TokenAuthenticator};
use crate::db::Db;
use crate::model::PageRequest;
use crate::{Config, Result};
use anyhow::Context;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, warn, Level};

pub(crate) use middleware::Admin;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub(crate) struct AppState {
    db: Db,
    auth: Arc<dyn Authenticator>,
}

impl AppState {
    pub(crate) fn new(db: Db, auth: Arc<dyn Authenticator>) -> Self {
        Self { db, auth }
    }
}

/// The body of a successful create, update or delete.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub(crate) fn done() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

/// The `page` query parameter of the list endpoints. Anything unusable falls back to page 1.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::from_param(self.page.as_deref())
    }
}

/// An `:id` path segment. Anything that is not an integer cannot name a record.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// Builds the full application: routes, authentication and the request id / tracing layers.
pub(crate) fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route("/categories/all", get(categories::all))
        .route(
            "/categories/:id",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/bills", get(bills::list).post(bills::create))
        .route("/bills/summary", get(bills::summary))
        .route(
            "/bills/:id",
            get(bills::show).put(bills::update).delete(bills::delete),
        )
        .route("/charts/line", get(charts::line))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    Router::new().nest("/v1", api).with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(middleware::make_span)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Builds the application for `config`, loading its identity file.
pub(crate) async fn app(config: &Config) -> Result<Router> {
    let identities = config.identities_path();
    let auth = TokenAuthenticator::load(&identities)
        .await
        .with_context(|| format!("Unable to load identities from {}", identities.display()))?;
    if auth.is_empty() {
        warn!("No identities are configured, every request will be rejected");
    } else {
        debug!("Loaded {} identities from {}", auth.len(), identities.display());
    }
    let state = AppState::new(config.db().clone(), Arc::new(auth));
    Ok(router(state))
}

/// Serves the application on `addr` until Ctrl-C is received.
pub(crate) async fn serve(config: &Config, addr: SocketAddr) -> Result<()> {
    let app = app(config).await?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    let local = listener
        .local_addr()
        .context("Unable to read the listening address")?;
    info!("Listening on http://{local}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("The server stopped with an error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            error!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await
        }
    }
}
