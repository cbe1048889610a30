//! Shared foundation for the Vigia services: configuration, database pool,
//! error type, and the domain model used by fan-out and delivery.

pub mod config;
pub mod db;
pub mod error;
pub mod types;
