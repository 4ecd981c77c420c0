//! # Slotwise Core
//!
//! Business logic for Slotwise with no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, calendars, mail and LLMs
//! - Use cases for accounts, availability, bookings and sync
//! - The rules-based scheduling agent and its knowledge base
//!
//! ## Architecture Principles
//! - Only depends on `slotwise-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod agent;
pub mod availability;
pub mod booking;
pub mod calendar;
pub mod knowledge;
pub mod notifications;
pub mod sync;
pub mod user;

// Re-export specific items to avoid ambiguity
pub use agent::{AgentService, ConversationRepository, LanguageModel};
pub use availability::{AvailabilityRepository, AvailabilityService};
pub use booking::{BookingRepository, BookingService, RescheduleService};
pub use calendar::{CalendarClient, CalendarGateway};
pub use knowledge::KnowledgeBase;
pub use notifications::{EmailMessage, Mailer, Notifier};
pub use sync::SyncService;
pub use user::{PasswordHasher, TokenService, UserRepository, UserService};
