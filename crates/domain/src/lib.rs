//! # Slotwise Domain
//!
//! Business domain types and models for Slotwise.
//!
//! This crate contains:
//! - Accounts, availability slots, bookings and calendar events
//! - Agent and knowledge base records
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Slotwise crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
