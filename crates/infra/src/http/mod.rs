//! Outbound HTTP plumbing shared by the Google and OpenAI integrations

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
