//! Domain types and models

pub mod agent;
pub mod availability;
pub mod booking;
pub mod calendar;
pub mod knowledge;
pub mod sync;
pub mod user;

pub use agent::*;
pub use availability::*;
pub use booking::*;
pub use calendar::*;
pub use knowledge::*;
pub use sync::*;
pub use user::*;
