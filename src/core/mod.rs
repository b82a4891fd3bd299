//! # Core Module
//!
//! Core domain types and configuration for the nosdois scheduler.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial creation with config and domain modules

pub mod config;
pub mod domain;

// Re-export commonly used items
pub use config::Config;
pub use domain::{
    Cadence, DailyActivity, NewNotification, NotificationKind, Relationship, Reminder,
};
