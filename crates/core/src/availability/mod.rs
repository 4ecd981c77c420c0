//! Availability slots

pub mod planner;
pub mod ports;
pub mod service;

pub use ports::AvailabilityRepository;
pub use service::{parse_slot_ids, AvailabilityService};
