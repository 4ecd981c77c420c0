//! Accounts and credentials

pub mod ports;
pub mod service;

pub use ports::{PasswordHasher, TokenService, UserRepository};
pub use service::UserService;
