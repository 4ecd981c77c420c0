//! # Slotwise Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories behind an r2d2 pool
//! - The retrying HTTP client
//! - Google OAuth, Calendar and Gmail adapters
//! - The OpenAI language model adapter
//! - Configuration loading, password hashing and JWT tokens
//! - The cron-driven calendar sync scheduler
//!
//! ## Architecture
//! - Implements traits defined in `slotwise-core`
//! - Contains all "impure" code (I/O, network, clocks)

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod knowledge;
pub mod mail;
pub mod scheduling;

pub use auth::{Argon2PasswordHasher, JwtTokenService};
pub use database::{
    DbManager, SqliteAvailabilityRepository, SqliteBookingRepository, SqliteConversationRepository,
    SqliteUserRepository,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::google::{GmailMailer, GoogleCalendarGateway, GoogleEndpoints, GoogleOAuth};
pub use integrations::openai::OpenAIClient;
pub use mail::NoopMailer;
pub use scheduling::{SchedulerError, SyncScheduler};
