//! # Features Module
//!
//! All feature modules for the nosdois backend. The scheduler ships a single
//! feature; CRUD/REST features live in their own services.

pub mod notify;

// Re-export feature items
pub use notify::NotifyScheduler;
