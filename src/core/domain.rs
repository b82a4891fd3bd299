//! Domain records the scheduler reads, and the notification it produces.
//!
//! These mirror the rows owned by the CRUD services. The scheduler treats all
//! of them as read-only; the only thing it ever creates is a `NewNotification`
//! handed to the dispatch interface.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A standalone reminder with an absolute due instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    /// Denormalized owning relationship, when the creating flow recorded one.
    pub relationship_id: Option<String>,
    pub title: String,
    pub due_at: DateTime<Utc>,
    pub active: bool,
    pub completed: bool,
    pub deleted: bool,
}

/// A date-only activity; `remind_minutes_before` counts back from UTC midnight
/// of `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyActivity {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub remind_minutes_before: Option<i64>,
    pub completed: bool,
    pub deleted: bool,
}

/// Recurrence class of a relationship celebration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Annual,
    Monthly,
}

impl Cadence {
    /// String representation used for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Annual => "annual",
            Cadence::Monthly => "monthly",
        }
    }

    /// Parse the database representation; unknown values fall back to annual.
    pub fn parse(raw: &str) -> Cadence {
        match raw {
            "monthly" => Cadence::Monthly,
            _ => Cadence::Annual,
        }
    }
}

/// A couple's relationship. `started_on` anchors celebration occurrences; a
/// relationship created without a start date has `None` and never celebrates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub user_a_id: String,
    pub user_b_id: String,
    pub started_on: Option<NaiveDate>,
    pub cadence: Cadence,
    pub active: bool,
    pub deleted: bool,
}

impl Relationship {
    /// Both members, for fan-out of shared notifications.
    pub fn members(&self) -> [&str; 2] {
        [&self.user_a_id, &self.user_b_id]
    }
}

/// Category tag attached to every dispatched notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reminder,
    Activity,
    Celebration,
}

impl NotificationKind {
    /// String representation used for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reminder => "reminder",
            NotificationKind::Activity => "activity",
            NotificationKind::Celebration => "celebration",
        }
    }
}

/// A notification the scheduler asks the dispatch interface to create and send.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub user_id: String,
    pub relationship_id: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}
