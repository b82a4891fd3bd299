// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Re-export core config
pub use core::Config;

// Re-export feature items
pub use features::notify::{
    NotificationDispatcher, NotifyScheduler, RelationshipResolver, SchedulerStore,
};
