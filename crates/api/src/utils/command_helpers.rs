//! Handler execution helpers
//!
//! Wraps a handler body with timing and outcome logging so every route
//! reports the same structured fields.

use std::future::Future;
use std::time::Instant;

use slotwise_domain::Result as DomainResult;
use tracing::debug;

use crate::error::ApiResult;
use crate::utils::logging::{error_label, log_command_execution};

/// Run a handler body, log its outcome and convert the error for axum.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn get_booking(
///     State(ctx): State<Arc<AppContext>>,
///     CurrentUser(user): CurrentUser,
///     Path(id): Path<i64>,
/// ) -> ApiResult<Json<Booking>> {
///     execute("bookings::get", || async { ctx.bookings.get_booking(&user, id).await })
///         .await
///         .map(Json)
/// }
/// ```
pub async fn execute<F, Fut, T>(command_name: &str, command_fn: F) -> ApiResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;
    let elapsed = start.elapsed();

    log_command_execution(command_name, elapsed, result.is_ok());
    if let Err(err) = &result {
        debug!(
            command = command_name,
            error_type = error_label(err),
            error = %err,
            "command failed"
        );
    }

    result.map_err(Into::into)
}
