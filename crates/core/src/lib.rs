//! Pathway Core Library
//!
//! This crate provides the foundational utilities for the Pathway assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ToolVariant};
pub use error::{AppError, AppResult};
