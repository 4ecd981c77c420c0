//! Calendar synchronisation

pub mod changes;
pub mod service;

pub use changes::has_event_changed;
pub use service::{SyncService, GOOGLE_PROVIDER};
