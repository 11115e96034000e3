//! Meeting-time collision rules.
//!
//! Intervals are half-open, so a class ending at 10:00 never collides with
//! one starting at 10:00 on the same day.

use crate::meeting::MeetingPattern;

pub fn days_overlap(a: &MeetingPattern, b: &MeetingPattern) -> bool {
    a.days().iter().any(|day| b.meets_on(*day))
}

pub fn times_overlap(a: &MeetingPattern, b: &MeetingPattern) -> bool {
    a.start_minute() < b.end_minute() && b.start_minute() < a.end_minute()
}

pub fn conflicts(a: &MeetingPattern, b: &MeetingPattern) -> bool {
    days_overlap(a, b) && times_overlap(a, b)
}
