//! Notification window predicate.

use chrono::{DateTime, Duration, Utc};

/// True when `candidate` falls inside `(now, now + lookahead]`.
///
/// The lower bound is exclusive so an instant that has already passed is not
/// re-notified on every following cycle; the upper bound is inclusive so a
/// due instant landing exactly on the window edge still fires.
pub fn in_window(now: DateTime<Utc>, candidate: DateTime<Utc>, lookahead: Duration) -> bool {
    candidate > now && candidate <= now + lookahead
}
