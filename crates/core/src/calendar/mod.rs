//! Calendar provider boundary

pub mod ports;

pub use ports::{CalendarClient, CalendarGateway};
