//! Next-occurrence calculation for recurring celebrations.
//!
//! Given the relationship-start date as an anchor, computes the next annual
//! or monthly occurrence on or after a reference day, clamping the anchor's
//! day-of-month to the target month's length (Feb 29 anchors celebrate on
//! Feb 28 in non-leap years, day-31 anchors on the 30th in 30-day months).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::core::domain::Cadence;

/// Next occurrence of `anchor` under `cadence`, on or after `today`, as
/// midnight UTC of the occurrence date. `None` only when the anchor produces
/// no representable date (the relationship simply skips the cycle).
pub fn next_occurrence(
    anchor: NaiveDate,
    cadence: Cadence,
    today: NaiveDate,
) -> Option<DateTime<Utc>> {
    let date = match cadence {
        Cadence::Annual => {
            let candidate = clamped_date(today.year(), anchor.month(), anchor.day())?;
            if candidate < today {
                clamped_date(today.year() + 1, anchor.month(), anchor.day())?
            } else {
                candidate
            }
        }
        Cadence::Monthly => {
            let candidate = clamped_date(today.year(), today.month(), anchor.day())?;
            if candidate < today {
                let (year, month) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                clamped_date(year, month, anchor.day())?
            } else {
                candidate
            }
        }
    };
    Some(midnight_utc(date))
}

/// Midnight UTC of a calendar date; daily activities and celebrations carry no
/// time-of-day, so this is the instant the window predicate compares.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Due instant of a daily activity: midnight UTC of its date minus the
/// configured lead time.
pub fn activity_due_instant(date: NaiveDate, lead_minutes: i64) -> DateTime<Utc> {
    midnight_utc(date) - Duration::minutes(lead_minutes)
}

/// `year-month-day`, with `day` pulled back to the last valid day of the
/// month when the month is shorter.
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| (28..day).rev().find_map(|d| NaiveDate::from_ymd_opt(year, month, d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn test_annual_same_year_when_not_yet_passed() {
        let next = next_occurrence(date(2023, 6, 10), Cadence::Annual, date(2025, 3, 1));

        assert_eq!(next, Some(midnight_utc(date(2025, 6, 10))));
    }

    #[test]
    fn test_annual_rolls_to_next_year_when_passed() {
        let next = next_occurrence(date(2023, 6, 10), Cadence::Annual, date(2025, 6, 11));

        assert_eq!(next, Some(midnight_utc(date(2026, 6, 10))));
    }

    #[test]
    fn test_annual_on_the_day_stays_in_year() {
        let next = next_occurrence(date(2023, 1, 15), Cadence::Annual, date(2025, 1, 15));

        assert_eq!(next, Some(midnight_utc(date(2025, 1, 15))));
    }

    #[test]
    fn test_annual_feb_29_clamps_in_non_leap_year() {
        let next = next_occurrence(date(2024, 2, 29), Cadence::Annual, date(2025, 2, 1));

        assert_eq!(next, Some(midnight_utc(date(2025, 2, 28))));
    }

    #[test]
    fn test_annual_feb_29_kept_in_leap_year() {
        let next = next_occurrence(date(2024, 2, 29), Cadence::Annual, date(2028, 2, 1));

        assert_eq!(next, Some(midnight_utc(date(2028, 2, 29))));
    }

    #[test]
    fn test_monthly_day_31_clamps_in_april() {
        let next = next_occurrence(date(2024, 1, 31), Cadence::Monthly, date(2025, 4, 10));

        assert_eq!(next, Some(midnight_utc(date(2025, 4, 30))));
    }

    #[test]
    fn test_monthly_rolls_to_next_month_when_passed() {
        let next = next_occurrence(date(2024, 1, 5), Cadence::Monthly, date(2025, 4, 10));

        assert_eq!(next, Some(midnight_utc(date(2025, 5, 5))));
    }

    #[test]
    fn test_monthly_december_rolls_into_next_year() {
        let next = next_occurrence(date(2024, 1, 5), Cadence::Monthly, date(2025, 12, 20));

        assert_eq!(next, Some(midnight_utc(date(2026, 1, 5))));
    }

    #[test]
    fn test_monthly_day_31_kept_in_full_length_month() {
        let next = next_occurrence(date(2024, 1, 31), Cadence::Monthly, date(2025, 3, 1));

        assert_eq!(next, Some(midnight_utc(date(2025, 3, 31))));
    }

    #[test]
    fn test_monthly_on_the_day_stays_in_month() {
        let next = next_occurrence(date(2024, 1, 31), Cadence::Monthly, date(2025, 2, 28));

        assert_eq!(next, Some(midnight_utc(date(2025, 2, 28))));
    }

    #[test]
    fn test_activity_due_instant_subtracts_lead_time() {
        let due = activity_due_instant(date(2025, 1, 16), 1440);

        assert_eq!(due, midnight_utc(date(2025, 1, 15)));
    }
}
