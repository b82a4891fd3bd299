//! Scheduler loop and the three category passes.
//!
//! One cycle captures `now` once, runs the reminder, activity and celebration
//! passes sequentially against that single instant, and absorbs every failure
//! locally: a bad record is logged and skipped, a failed category query leaves
//! the other categories running, and nothing ever terminates the loop except
//! the shutdown signal.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::core::config::Config;
use crate::core::domain::{Cadence, NewNotification, NotificationKind, Reminder};
use crate::features::notify::occurrence::{activity_due_instant, next_occurrence};
use crate::features::notify::window::in_window;
use crate::features::notify::{NotificationDispatcher, RelationshipResolver, SchedulerStore};

/// Periodic background scheduler for couple notifications.
///
/// Owns its configuration and collaborators; no ambient state. Construct once
/// in the binary, hand it a shutdown receiver and `run` it to completion.
pub struct NotifyScheduler {
    store: Arc<dyn SchedulerStore>,
    resolver: Arc<dyn RelationshipResolver>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    cycle_period: Duration,
    lookahead: ChronoDuration,
}

impl NotifyScheduler {
    pub fn new(
        store: Arc<dyn SchedulerStore>,
        resolver: Arc<dyn RelationshipResolver>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: &Config,
    ) -> Self {
        NotifyScheduler {
            store,
            resolver,
            dispatcher,
            cycle_period: config.cycle_period,
            lookahead: config.lookahead,
        }
    }

    /// Run cycles until the shutdown signal fires. Only the inter-cycle wait
    /// is a cancellation point; a cycle that has started runs to completion.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "notification scheduler started (period: {:?}, lookahead: {}min)",
            self.cycle_period,
            self.lookahead.num_minutes()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle(Utc::now()).await;

            tokio::select! {
                _ = sleep(self.cycle_period) => {}
                changed = shutdown.changed() => {
                    // A closed channel means the binary is going away too.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("notification scheduler stopped");
    }

    /// One full pass over all three categories against a single reference
    /// instant. Public so tests can drive cycles with a fixed `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) {
        debug!("notification cycle starting at {now}");

        if let Err(e) = self.process_reminders(now).await {
            error!("reminder pass failed: {e:#}");
        }
        if let Err(e) = self.process_activities(now).await {
            error!("activity pass failed: {e:#}");
        }
        if let Err(e) = self.process_celebrations(now).await {
            error!("celebration pass failed: {e:#}");
        }
    }

    /// Standalone reminders with a due instant inside the window.
    async fn process_reminders(&self, now: DateTime<Utc>) -> Result<()> {
        let window_end = now + self.lookahead;
        let reminders = self.store.due_reminders(now, window_end).await?;
        debug!("{} reminder(s) due within the window", reminders.len());

        for reminder in reminders {
            let relationship_id = match self.reminder_relationship(&reminder).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    debug!(
                        "reminder {} skipped: no active relationship for user {}",
                        reminder.id, reminder.user_id
                    );
                    continue;
                }
                Err(e) => {
                    warn!("reminder {}: relationship lookup failed: {e:#}", reminder.id);
                    continue;
                }
            };

            let notification = NewNotification {
                user_id: reminder.user_id.clone(),
                relationship_id,
                title: "Lembrete".to_string(),
                body: format!("Seu lembrete \"{}\" está chegando!", reminder.title),
                kind: NotificationKind::Reminder,
                created_at: now,
            };
            if let Err(e) = self.dispatcher.create_and_send(notification).await {
                warn!(
                    "failed to send reminder notification for {}: {e:#}",
                    reminder.id
                );
            }
        }

        Ok(())
    }

    /// The denormalized relationship id when present, otherwise resolve by
    /// the owning user.
    async fn reminder_relationship(&self, reminder: &Reminder) -> Result<Option<String>> {
        if let Some(id) = &reminder.relationship_id {
            return Ok(Some(id.clone()));
        }
        let relationship = self
            .resolver
            .active_relationship_for(&reminder.user_id)
            .await?;
        Ok(relationship.map(|r| r.id))
    }

    /// Daily activities whose lead-time instant falls inside the window.
    ///
    /// The lead time counts back from UTC midnight of the activity's date;
    /// there is no per-user timezone normalization, so users far from UTC can
    /// see the alert shifted around midnight boundaries.
    async fn process_activities(&self, now: DateTime<Utc>) -> Result<()> {
        let activities = self.store.pending_activities().await?;
        debug!("{} activity(ies) with a configured lead time", activities.len());

        for activity in activities {
            let Some(lead_minutes) = activity.remind_minutes_before else {
                continue;
            };
            let due = activity_due_instant(activity.date, lead_minutes);
            if !in_window(now, due, self.lookahead) {
                continue;
            }

            let relationship = match self.resolver.active_relationship_for(&activity.user_id).await
            {
                Ok(Some(relationship)) => relationship,
                Ok(None) => {
                    debug!(
                        "activity {} skipped: no active relationship for user {}",
                        activity.id, activity.user_id
                    );
                    continue;
                }
                Err(e) => {
                    warn!("activity {}: relationship lookup failed: {e:#}", activity.id);
                    continue;
                }
            };

            let notification = NewNotification {
                user_id: activity.user_id.clone(),
                relationship_id: relationship.id,
                title: "Atividade do dia".to_string(),
                body: format!("Sua atividade \"{}\" começa em breve!", activity.title),
                kind: NotificationKind::Activity,
                created_at: now,
            };
            if let Err(e) = self.dispatcher.create_and_send(notification).await {
                warn!(
                    "failed to send activity notification for {}: {e:#}",
                    activity.id
                );
            }
        }

        Ok(())
    }

    /// Recurring celebrations; both members get the notification, and one
    /// failed send never suppresses the other.
    async fn process_celebrations(&self, now: DateTime<Utc>) -> Result<()> {
        let today = now.date_naive();
        let relationships = self.store.active_relationships().await?;
        debug!("{} relationship(s) with a start date", relationships.len());

        for relationship in relationships {
            let Some(anchor) = relationship.started_on else {
                continue;
            };
            let Some(due) = next_occurrence(anchor, relationship.cadence, today) else {
                continue;
            };
            if !in_window(now, due, self.lookahead) {
                continue;
            }

            let (title, body) = celebration_text(relationship.cadence);
            for member in relationship.members() {
                let notification = NewNotification {
                    user_id: member.to_string(),
                    relationship_id: relationship.id.clone(),
                    title: title.to_string(),
                    body: body.to_string(),
                    kind: NotificationKind::Celebration,
                    created_at: now,
                };
                if let Err(e) = self.dispatcher.create_and_send(notification).await {
                    warn!(
                        "failed to send celebration notification to {member} for relationship {}: {e:#}",
                        relationship.id
                    );
                }
            }
        }

        Ok(())
    }
}

/// Shared title/body for a celebration notification.
fn celebration_text(cadence: Cadence) -> (&'static str, &'static str) {
    match cadence {
        Cadence::Annual => (
            "Aniversário de namoro 💕",
            "O aniversário de vocês está chegando. Preparem a comemoração!",
        ),
        Cadence::Monthly => (
            "Mêsversário 💕",
            "O mêsversário de vocês está chegando. Preparem a comemoração!",
        ),
    }
}
