use chrono::{NaiveTime, Weekday};
use course_roster::{MeetingPattern, PatternError};

#[test]
fn parse_normalizes_day_order_and_case() {
    let pattern = MeetingPattern::parse("fwm", "09:00", "10:15").unwrap();
    assert_eq!(pattern.days(), &[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    assert_eq!(pattern.day_codes(), "MWF");
    assert_eq!(pattern.start_minute(), 540);
    assert_eq!(pattern.end_minute(), 615);
    assert_eq!(pattern.duration_minutes(), 75);
    assert_eq!(pattern.to_string(), "MWF 09:00-10:15");
}

#[test]
fn thursday_and_sunday_have_distinct_codes() {
    let pattern = MeetingPattern::parse("TRSU", "18:00", "19:00").unwrap();
    assert!(pattern.meets_on(Weekday::Tue));
    assert!(pattern.meets_on(Weekday::Thu));
    assert!(pattern.meets_on(Weekday::Sat));
    assert!(pattern.meets_on(Weekday::Sun));
    assert!(!pattern.meets_on(Weekday::Mon));
    assert_eq!(pattern.day_codes(), "TRSU");
}

#[test]
fn rejects_empty_days() {
    assert_eq!(
        MeetingPattern::parse("  ", "09:00", "10:00"),
        Err(PatternError::NoDays)
    );
    assert_eq!(
        MeetingPattern::from_minutes(Vec::new(), 60, 120),
        Err(PatternError::NoDays)
    );
}

#[test]
fn rejects_unknown_day_code() {
    assert_eq!(
        MeetingPattern::parse("MX", "09:00", "10:00"),
        Err(PatternError::UnknownDay('X'))
    );
}

#[test]
fn rejects_malformed_times() {
    assert!(matches!(
        MeetingPattern::parse("M", "9am", "10:00"),
        Err(PatternError::InvalidTime(_))
    ));
    assert!(matches!(
        MeetingPattern::parse("M", "09:00", "25:00"),
        Err(PatternError::InvalidTime(_))
    ));
}

#[test]
fn rejects_zero_and_negative_length_meetings() {
    assert!(matches!(
        MeetingPattern::parse("M", "10:00", "10:00"),
        Err(PatternError::EmptyInterval { .. })
    ));
    assert!(matches!(
        MeetingPattern::parse("M", "11:00", "10:00"),
        Err(PatternError::EmptyInterval { .. })
    ));
}

#[test]
fn new_accepts_naive_times() {
    let start = NaiveTime::from_hms_opt(13, 30, 0).unwrap();
    let end = NaiveTime::from_hms_opt(14, 45, 0).unwrap();
    let pattern = MeetingPattern::new([Weekday::Thu, Weekday::Tue], start, end).unwrap();
    assert_eq!(pattern.day_codes(), "TR");
    assert_eq!(pattern.start_text(), "13:30");
    assert_eq!(pattern.end_text(), "14:45");
}

#[test]
fn serde_uses_text_form() {
    let pattern = MeetingPattern::parse("MW", "08:00", "09:15").unwrap();
    let json = serde_json::to_value(&pattern).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "days": "MW", "start": "08:00", "end": "09:15" })
    );

    let bad = serde_json::json!({ "days": "MW", "start": "09:15", "end": "08:00" });
    assert!(serde_json::from_value::<MeetingPattern>(bad).is_err());
}
