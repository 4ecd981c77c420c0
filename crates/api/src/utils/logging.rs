use std::time::Duration;

use slotwise_domain::SlotwiseError;
use tracing::{info, warn};

/// Log the outcome of a handler with structured fields.
///
/// # Parameters
/// * `command` - Logical handler identifier (e.g. `"bookings::cancel"`).
/// * `elapsed` - Time the handler took.
/// * `success` - Whether the handler completed successfully.
///
/// Callers must avoid forwarding guest data or tokens in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Stable label for a `SlotwiseError`, used in log fields.
#[inline]
pub const fn error_label(error: &SlotwiseError) -> &'static str {
    error.kind()
}
