//! Conversational scheduling agent
//!
//! Messages are classified with regex rules, entities are carried across the
//! turns of one conversation, and the resulting intent is dispatched to the
//! booking and availability services.

pub mod analyzer;
pub mod context;
pub mod ports;
pub mod service;

pub use analyzer::analyze;
pub use ports::{ConversationRepository, LanguageModel};
pub use service::{AgentService, MAX_TURNS};
