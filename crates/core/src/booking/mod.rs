//! Bookings and their calendar mirror

pub mod mirror;
pub mod ports;
pub mod reschedule;
pub mod service;

pub use ports::BookingRepository;
pub use reschedule::RescheduleService;
pub use service::BookingService;
