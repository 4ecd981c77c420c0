//! # Slotwise API
//!
//! axum HTTP surface over the Slotwise services.
//!
//! This crate contains:
//! - The dependency injection context ([`AppContext`])
//! - Route handlers under `/api/v1`
//! - The bearer/cookie authentication extractor
//! - Mapping from domain errors to HTTP responses
//! - Tracing initialisation and the `slotwise` binary

pub mod auth;
pub mod context;
pub mod error;
pub mod routes;
pub mod utils;

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use routes::router;

const DEFAULT_LOG_FILTER: &str = "info,slotwise=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter; `SLOTWISE_LOG_FORMAT=json`
/// switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("SLOTWISE_LOG_FORMAT")
        .is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let result = if json {
        fmt().with_env_filter(filter).json().with_current_span(false).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

/// Router with its context attached, ready to serve.
pub fn app(ctx: AppContext) -> axum::Router {
    router(Arc::new(ctx))
}
