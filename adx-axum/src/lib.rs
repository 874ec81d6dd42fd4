#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod bid_routes;
mod item_routes;

use adx_core::models::Address;
use adx_exchange::{
    Application,
    error::{ErrorKind, ExchangeError},
};
use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json, http::StatusCode};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{Level, event};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

fn api_routes<T: ApiApplication>(extra: ApiRouter<T>) -> ApiRouter<T> {
    ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/bid", bid_routes::router())
        .nest("/adunit", item_routes::adunit_router())
        .nest("/adslot", item_routes::adslot_router())
        .merge(extra)
        .nest_api_service("/docs", docs_routes())
}

/// Construct a full API router with the given state and config
pub fn router<T: ApiApplication>(state: T, config: &AxumConfig) -> axum::Router {
    router_with(state, config, ApiRouter::new())
}

/// Construct a full API router, serving and documenting `extra` alongside
/// the exchange endpoints
pub fn router_with<T: ApiApplication>(
    state: T,
    config: &AxumConfig,
    extra: ApiRouter<T>,
) -> axum::Router {
    let mut api = OpenApi::default();
    let router = api_routes(extra)
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api))) // Arc is very important here or you will face massive memory and performance issues
        .with_state(state);

    if config.permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// The OpenAPI document describing [`router_with`] for the same `extra` routes
pub fn openapi<T: ApiApplication>(extra: ApiRouter<T>) -> OpenApi {
    let mut api = OpenApi::default();
    let _ = api_routes(extra).finish_api_with(&mut api, api_docs);
    api
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
    extra: ApiRouter<T>,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!("Listening for requests on {}", listener.local_addr()?);

    let service = router_with(app, &config, extra);
    axum::serve(listener, service).await
}

/// Axum imposes all sorts of constraints on what can pass for state. This
/// trait, coupled with a blanket implementation, specifies it all upfront and
/// in one place. If a function takes a generic `T: ApiApplication`, then
/// everything one might reasonably want to do should work.
pub trait ApiApplication:
    Clone
    + Send
    + Sync
    + 'static
    + Application<
        Context = Authorization<Bearer>,
        Registry: Send + 'static,
        Ledger: Send + 'static,
        Clock: Send + 'static,
    >
{
}

// this is the blanket implementation
impl<T: Clone + Send + Sync + 'static> ApiApplication for T where
    T: Application<
            Context = Authorization<Bearer>,
            Registry: Send + 'static,
            Ledger: Send + 'static,
            Clock: Send + 'static,
        >
{
}

/// Resolve the account behind the bearer token.
pub(crate) async fn caller<T: ApiApplication>(
    app: &T,
    auth: &Authorization<Bearer>,
) -> Result<Address, (StatusCode, String)> {
    app.caller(auth)
        .await
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "not authorized".to_string()))
}

/// The HTTP status for each kind of rejected exchange operation.
pub fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::State | ErrorKind::TimeoutNotElapsed => StatusCode::CONFLICT,
        ErrorKind::Escrow => StatusCode::PAYMENT_REQUIRED,
    }
}

pub(crate) fn rejection(err: ExchangeError) -> (StatusCode, String) {
    let status = status_of(err.kind());
    event!(Level::DEBUG, %status, err = err.to_string(), "request rejected");
    (status, err.to_string())
}
