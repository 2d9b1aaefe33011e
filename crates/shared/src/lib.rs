//! Shared types, errors, and configuration for Homeledger.
//!
//! This crate provides common types used across all other crates:
//! - `Money` with exact cent precision
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management (server + ledger seeds)

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
