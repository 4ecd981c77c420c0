//! HTTP routes
//!
//! Every handler delegates to a service on [`AppContext`] through
//! [`execute`](crate::utils::command_helpers::execute) so outcomes are logged
//! uniformly.

pub mod agent;
pub mod auth;
pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod extract;
pub mod health;
pub mod public;
pub mod sync;
pub mod users;
pub mod webhooks;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::context::AppContext;

pub type AppState = Arc<AppContext>;

/// Full application router
pub fn router(ctx: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/availability", availability::routes())
        .nest("/bookings", bookings::routes())
        .nest("/public", public::routes())
        .nest("/calendar", calendar::routes().merge(sync::routes()))
        .nest("/webhooks", webhooks::routes())
        .nest("/agent", agent::routes());

    Router::new().route("/health", get(health::health)).nest("/api/v1", api).with_state(ctx)
}
