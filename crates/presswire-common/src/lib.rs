//! presswire-common — shared error type and environment configuration used
//! across all Presswire crates.

pub mod config;
pub mod error;

pub use config::Settings;
pub use error::{PresswireError, Result};
