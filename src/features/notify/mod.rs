//! # Feature: Notification Scheduler
//!
//! Periodic background scheduler for couple notifications. Each cycle scans
//! three categories — standalone reminders, daily activities with lead-time
//! alerts, and recurring celebrations (aniversário / mêsversário) — and
//! dispatches a notification for every record whose due instant falls inside
//! the upcoming lookahead window. Delivery is at-most-once per cycle: a record
//! that fails to dispatch is logged and retried naturally only if it is still
//! in-window on a later cycle.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Celebrations notify both members independently
//! - 1.0.0: Initial release with reminder, activity and celebration passes

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::domain::{DailyActivity, NewNotification, Relationship, Reminder};

pub mod occurrence;
pub mod scheduler;
pub mod window;

pub use scheduler::NotifyScheduler;

/// Read-only queries the scheduler issues against the domain store. All
/// filtering on active/completed/soft-deleted flags happens behind this trait
/// so a record excluded by its flags never reaches a processor.
#[async_trait]
pub trait SchedulerStore: Send + Sync {
    /// Active, not-completed, not-deleted reminders with
    /// `now < due_at <= window_end`.
    async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reminder>>;

    /// Not-completed, not-deleted activities that have a configured lead time.
    async fn pending_activities(&self) -> Result<Vec<DailyActivity>>;

    /// Active, not-deleted relationships with a known start date.
    async fn active_relationships(&self) -> Result<Vec<Relationship>>;
}

/// Resolves the single active relationship a user belongs to, if any.
#[async_trait]
pub trait RelationshipResolver: Send + Sync {
    async fn active_relationship_for(&self, user_id: &str) -> Result<Option<Relationship>>;
}

/// Creates and delivers one notification. Implementations may fail per call;
/// the scheduler logs and moves on.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn create_and_send(&self, notification: NewNotification) -> Result<()>;
}
