//! # Model Layer
//!
//! Relational model of the chat service and the reserved assistant identity.
//!
//! All durable state lives in the database; nothing here caches rows between
//! calls.

pub mod assistant;
pub mod store;
