//! # Core Library
//!
//! Core models, database, configuration, and error handling for the chat service.

pub mod config;
pub mod error;
pub mod model;
pub mod dto;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use model::store::{DbPool, create_in_memory_pool, create_pool, run_migrations};
