//! Third-party service integrations

pub mod google;
pub mod openai;
