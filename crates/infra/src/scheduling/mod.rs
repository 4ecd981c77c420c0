//! Background calendar synchronisation
//!
//! The scheduler owns a `tokio-cron-scheduler` instance with a single job
//! that runs one sync cycle per tick. Lifecycle is explicit: `start` and
//! `stop` are both bounded by timeouts and a cancellation token tracks the
//! monitor task.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{cron_for_interval, SyncScheduler, SyncSchedulerConfig};
