//! # Database Module
//!
//! SQLite-backed implementation of the scheduler's consumed interfaces: the
//! read-only domain queries, relationship resolution, and the notification
//! outbox the realtime layer drains. The scheduler never writes domain rows;
//! its only insert is into `notifications`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with schema bootstrap and scheduler queries

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::info;
use sqlite::{ConnectionThreadSafe, State, Statement};
use uuid::Uuid;

use crate::core::domain::{
    Cadence, DailyActivity, NewNotification, Relationship, Reminder,
};
use crate::features::notify::{NotificationDispatcher, RelationshipResolver, SchedulerStore};

/// Schema bootstrap, idempotent. Domain tables are owned by the CRUD
/// services; creating them here keeps a fresh scheduler deployment runnable.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    relationship_id TEXT,
    title           TEXT NOT NULL,
    due_at          TEXT NOT NULL,
    active          INTEGER NOT NULL DEFAULT 1,
    completed       INTEGER NOT NULL DEFAULT 0,
    deleted         INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_reminders_due_at ON reminders (due_at);

CREATE TABLE IF NOT EXISTS daily_activities (
    id                    TEXT PRIMARY KEY,
    user_id               TEXT NOT NULL,
    title                 TEXT NOT NULL,
    date                  TEXT NOT NULL,
    remind_minutes_before INTEGER,
    completed             INTEGER NOT NULL DEFAULT 0,
    deleted               INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS relationships (
    id         TEXT PRIMARY KEY,
    user_a_id  TEXT NOT NULL,
    user_b_id  TEXT NOT NULL,
    started_on TEXT,
    cadence    TEXT NOT NULL DEFAULT 'annual',
    active     INTEGER NOT NULL DEFAULT 1,
    deleted    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS notifications (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    relationship_id TEXT NOT NULL,
    title           TEXT NOT NULL,
    body            TEXT NOT NULL,
    kind            TEXT NOT NULL,
    payload         TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);
";

/// Thread-safe SQLite handle shared by all scheduler collaborators.
pub struct Database {
    connection: ConnectionThreadSafe,
}

impl Database {
    /// Open (or create) the database and apply the schema.
    pub fn open(path: &str) -> Result<Self> {
        let connection = sqlite::Connection::open_thread_safe(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        connection
            .execute(SCHEMA)
            .context("failed to apply database schema")?;
        Ok(Database { connection })
    }
}

/// RFC 3339 with second precision; uniform format keeps lexicographic
/// ordering aligned with chronological ordering for the SQL comparisons.
fn instant_to_sql(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp in database: \"{raw}\""))?;
    Ok(parsed.with_timezone(&Utc))
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date in database: \"{raw}\""))
}

fn read_reminder(statement: &Statement<'_>) -> Result<Reminder> {
    Ok(Reminder {
        id: statement.read::<String, _>("id")?,
        user_id: statement.read::<String, _>("user_id")?,
        relationship_id: statement.read::<Option<String>, _>("relationship_id")?,
        title: statement.read::<String, _>("title")?,
        due_at: parse_instant(&statement.read::<String, _>("due_at")?)?,
        active: statement.read::<i64, _>("active")? != 0,
        completed: statement.read::<i64, _>("completed")? != 0,
        deleted: statement.read::<i64, _>("deleted")? != 0,
    })
}

fn read_activity(statement: &Statement<'_>) -> Result<DailyActivity> {
    Ok(DailyActivity {
        id: statement.read::<String, _>("id")?,
        user_id: statement.read::<String, _>("user_id")?,
        title: statement.read::<String, _>("title")?,
        date: parse_day(&statement.read::<String, _>("date")?)?,
        remind_minutes_before: statement.read::<Option<i64>, _>("remind_minutes_before")?,
        completed: statement.read::<i64, _>("completed")? != 0,
        deleted: statement.read::<i64, _>("deleted")? != 0,
    })
}

fn read_relationship(statement: &Statement<'_>) -> Result<Relationship> {
    let started_on = match statement.read::<Option<String>, _>("started_on")? {
        Some(raw) => Some(parse_day(&raw)?),
        None => None,
    };
    Ok(Relationship {
        id: statement.read::<String, _>("id")?,
        user_a_id: statement.read::<String, _>("user_a_id")?,
        user_b_id: statement.read::<String, _>("user_b_id")?,
        started_on,
        cadence: Cadence::parse(&statement.read::<String, _>("cadence")?),
        active: statement.read::<i64, _>("active")? != 0,
        deleted: statement.read::<i64, _>("deleted")? != 0,
    })
}

#[async_trait]
impl SchedulerStore for Database {
    async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reminder>> {
        let mut statement = self.connection.prepare(
            "SELECT id, user_id, relationship_id, title, due_at, active, completed, deleted
             FROM reminders
             WHERE active = 1 AND completed = 0 AND deleted = 0
               AND due_at > ? AND due_at <= ?
             ORDER BY due_at",
        )?;
        statement.bind((1, instant_to_sql(now).as_str()))?;
        statement.bind((2, instant_to_sql(window_end).as_str()))?;

        let mut reminders = Vec::new();
        while statement.next()? == State::Row {
            reminders.push(read_reminder(&statement)?);
        }
        Ok(reminders)
    }

    async fn pending_activities(&self) -> Result<Vec<DailyActivity>> {
        let mut statement = self.connection.prepare(
            "SELECT id, user_id, title, date, remind_minutes_before, completed, deleted
             FROM daily_activities
             WHERE completed = 0 AND deleted = 0 AND remind_minutes_before IS NOT NULL",
        )?;

        let mut activities = Vec::new();
        while statement.next()? == State::Row {
            activities.push(read_activity(&statement)?);
        }
        Ok(activities)
    }

    async fn active_relationships(&self) -> Result<Vec<Relationship>> {
        let mut statement = self.connection.prepare(
            "SELECT id, user_a_id, user_b_id, started_on, cadence, active, deleted
             FROM relationships
             WHERE active = 1 AND deleted = 0 AND started_on IS NOT NULL",
        )?;

        let mut relationships = Vec::new();
        while statement.next()? == State::Row {
            relationships.push(read_relationship(&statement)?);
        }
        Ok(relationships)
    }
}

#[async_trait]
impl RelationshipResolver for Database {
    async fn active_relationship_for(&self, user_id: &str) -> Result<Option<Relationship>> {
        let mut statement = self.connection.prepare(
            "SELECT id, user_a_id, user_b_id, started_on, cadence, active, deleted
             FROM relationships
             WHERE active = 1 AND deleted = 0 AND (user_a_id = ? OR user_b_id = ?)
             LIMIT 1",
        )?;
        statement.bind((1, user_id))?;
        statement.bind((2, user_id))?;

        if statement.next()? == State::Row {
            Ok(Some(read_relationship(&statement)?))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl NotificationDispatcher for Database {
    /// Write the notification into the outbox the realtime layer drains. The
    /// JSON payload carries the full record for the wire.
    async fn create_and_send(&self, notification: NewNotification) -> Result<()> {
        let payload = serde_json::to_string(&notification)
            .context("failed to serialize notification payload")?;

        let mut statement = self.connection.prepare(
            "INSERT INTO notifications
                 (id, user_id, relationship_id, title, body, kind, payload, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, Uuid::new_v4().to_string().as_str()))?;
        statement.bind((2, notification.user_id.as_str()))?;
        statement.bind((3, notification.relationship_id.as_str()))?;
        statement.bind((4, notification.title.as_str()))?;
        statement.bind((5, notification.body.as_str()))?;
        statement.bind((6, notification.kind.as_str()))?;
        statement.bind((7, payload.as_str()))?;
        statement.bind((8, instant_to_sql(notification.created_at).as_str()))?;
        while statement.next()? != State::Done {}

        info!(
            "notification queued for user {} ({})",
            notification.user_id,
            notification.kind.as_str()
        );
        Ok(())
    }
}
