#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::Error;
use crate::api::JwtKeys;
use crate::api::router;
use crate::config::AppConfig;
use crate::config::StorageConfig;
use crate::payments::PaymentVerifier;
use crate::storage::Memory;
use crate::storage::Postgres;
use crate::storage::Storage;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

mod access;
mod api;
mod config;
mod courses;
mod graceful_shutdown;
mod notes;
mod password;
mod payments;
mod storage;
mod subscriptions;
#[cfg(test)]
mod tests;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "phunzi=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(AppConfig::from_env()).await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Database connection
/// - Database migrations
pub async fn setup_app(config: AppConfig) -> Result<Router> {
    let jwt_keys = JwtKeys::new(config.jwt_secret.as_bytes());
    let payment_verifier = setup_payment_verifier(config.payment_secret.as_deref());

    tracing::debug!("Using {:?} storage", config.storage);

    let router = match config.storage {
        StorageConfig::Memory => create_router(Memory::new(), jwt_keys, payment_verifier),
        StorageConfig::Postgres { database_url } => create_router(
            Postgres::connect(&database_url).await?,
            jwt_keys,
            payment_verifier,
        ),
    };

    Ok(router)
}

/// Create the router for Phunzi
fn create_router<S: Storage>(
    storage: S,
    jwt_keys: JwtKeys,
    payment_verifier: PaymentVerifier,
) -> Router {
    Router::new()
        .nest("/api", router::<S>())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(jwt_keys))
        .layer(Extension(payment_verifier))
}

/// Anything outside of the API
async fn fallback() -> Error {
    Error::not_found("Not found")
}

fn setup_payment_verifier(payment_secret: Option<&str>) -> PaymentVerifier {
    if let Some(payment_secret) = payment_secret {
        PaymentVerifier::signed(payment_secret.as_bytes())
    } else {
        tracing::warn!("`PAYMENT_SECRET` is not set, every subscribe request counts as paid");

        PaymentVerifier::Mock
    }
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            env_var("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        let port = port.parse::<u16>()?;

        address.set_port(port);
    }

    Ok(address)
}
