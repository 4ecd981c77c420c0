//! Shared helpers

pub mod timezone;
