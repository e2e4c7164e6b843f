use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::AvailabilityWindow;
use shared_models::time::day_of_week;

use crate::models::{AvailabilityCheck, DoctorError};

/// Checks candidate appointment windows against a doctor's declared weekly
/// availability. Times are read in UTC and weekdays count from Sunday = 0.
pub struct AvailabilityValidator {
    store: Arc<dyn SchedulingStore>,
}

impl AvailabilityValidator {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn check_window(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AvailabilityCheck, DoctorError> {
        debug!("Checking availability for doctor {} from {} to {}", doctor_id, start, end);

        if spans_midnight(start, end) {
            return Ok(AvailabilityCheck::SpansMidnight);
        }

        let windows = self.store.availability_windows(doctor_id).await?;
        let check = evaluate_windows(&windows, start, end);

        debug!("Availability check for doctor {}: {:?}", doctor_id, check);
        Ok(check)
    }
}

/// The window covers more than one calendar day.
pub fn spans_midnight(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    day_of_week(start) != day_of_week(end - Duration::nanoseconds(1))
}

/// Pure containment test over an already-loaded set of windows, treated as a
/// union: the candidate must fit inside at least one window of its weekday.
pub fn evaluate_windows(
    windows: &[AvailabilityWindow],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AvailabilityCheck {
    if spans_midnight(start, end) {
        return AvailabilityCheck::SpansMidnight;
    }

    let day = day_of_week(start);
    let mut day_windows = windows.iter().filter(|w| w.day_of_week == day).peekable();

    if day_windows.peek().is_none() {
        return AvailabilityCheck::NoWindowsForDay { day_of_week: day };
    }

    // Ending exactly at midnight is 24:00, which no time-of-day window reaches
    if end.time() == NaiveTime::MIN {
        return AvailabilityCheck::OutsideWindows { day_of_week: day };
    }

    let (start_time, end_time) = (start.time(), end.time());
    let covered = day_windows.any(|w| w.start_time <= start_time && w.end_time >= end_time);

    if covered {
        AvailabilityCheck::Available
    } else {
        AvailabilityCheck::OutsideWindows { day_of_week: day }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2025-01-06 is a Monday (day 1)
    fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0).unwrap()
    }

    fn window(day: u8, start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
        AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: Uuid::nil(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    #[test]
    fn test_contained_window_is_available() {
        let windows = vec![window(1, (9, 0), (12, 0))];
        assert_eq!(evaluate_windows(&windows, monday(9, 0), monday(9, 30)), AvailabilityCheck::Available);
        assert_eq!(evaluate_windows(&windows, monday(11, 30), monday(12, 0)), AvailabilityCheck::Available);
    }

    #[test]
    fn test_partially_outside_is_rejected() {
        let windows = vec![window(1, (9, 0), (12, 0))];
        assert_eq!(
            evaluate_windows(&windows, monday(11, 45), monday(12, 15)),
            AvailabilityCheck::OutsideWindows { day_of_week: 1 }
        );
        assert_eq!(
            evaluate_windows(&windows, monday(8, 45), monday(9, 15)),
            AvailabilityCheck::OutsideWindows { day_of_week: 1 }
        );
    }

    #[test]
    fn test_other_weekday_windows_do_not_count() {
        let windows = vec![window(2, (0, 0), (23, 59))];
        assert_eq!(
            evaluate_windows(&windows, monday(9, 0), monday(9, 30)),
            AvailabilityCheck::NoWindowsForDay { day_of_week: 1 }
        );
        assert_eq!(
            evaluate_windows(&[], monday(9, 0), monday(9, 30)),
            AvailabilityCheck::NoWindowsForDay { day_of_week: 1 }
        );
    }

    #[test]
    fn test_any_single_window_must_contain_the_candidate() {
        // Adjacent windows are not merged into one interval
        let windows = vec![window(1, (9, 0), (10, 0)), window(1, (10, 0), (11, 0))];
        assert_eq!(evaluate_windows(&windows, monday(10, 0), monday(10, 30)), AvailabilityCheck::Available);
        assert_eq!(
            evaluate_windows(&windows, monday(9, 45), monday(10, 15)),
            AvailabilityCheck::OutsideWindows { day_of_week: 1 }
        );
    }

    #[test]
    fn test_midnight_crossing_is_rejected() {
        let windows = vec![window(1, (0, 0), (23, 59)), window(2, (0, 0), (23, 59))];
        let start = monday(23, 45);
        let end = start + Duration::minutes(30);
        assert_eq!(evaluate_windows(&windows, start, end), AvailabilityCheck::SpansMidnight);
    }

    #[test]
    fn test_ending_at_midnight_is_same_day_but_uncovered() {
        let windows = vec![window(1, (9, 0), (23, 59))];
        let start = monday(23, 30);
        let end = start + Duration::minutes(30);
        assert!(!spans_midnight(start, end));
        assert_eq!(
            evaluate_windows(&windows, start, end),
            AvailabilityCheck::OutsideWindows { day_of_week: 1 }
        );
    }

    #[test]
    fn test_sunday_is_day_zero() {
        let sunday = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
        let windows = vec![window(0, (9, 0), (12, 0))];
        assert_eq!(
            evaluate_windows(&windows, sunday, sunday + Duration::minutes(30)),
            AvailabilityCheck::Available
        );
    }
}
