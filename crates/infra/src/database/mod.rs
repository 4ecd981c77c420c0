//! SQLite persistence for accounts, availability, bookings and agent history

mod availability_repository;
mod booking_repository;
mod conversation_repository;
mod manager;
mod sql;
mod user_repository;

pub use availability_repository::SqliteAvailabilityRepository;
pub use booking_repository::SqliteBookingRepository;
pub use conversation_repository::SqliteConversationRepository;
pub use manager::{DbManager, SqliteConnection, SqlitePool};
pub use user_repository::SqliteUserRepository;
