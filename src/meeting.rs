use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("meeting days must name at least one weekday")]
    NoDays,
    #[error("unknown weekday code '{0}' (expected one of M, T, W, R, F, S, U)")]
    UnknownDay(char),
    #[error("invalid time '{0}' (expected HH:mm)")]
    InvalidTime(String),
    #[error("meeting must end after it starts ({start} to {end})")]
    EmptyInterval { start: String, end: String },
}

/// When a course meets: a non-empty set of weekdays and a half-open
/// `[start, end)` interval in minutes since midnight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MeetingPatternRecord", into = "MeetingPatternRecord")]
pub struct MeetingPattern {
    days: Vec<Weekday>,
    start_minute: u32,
    end_minute: u32,
}

/// Textual form used by the flat files and by serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingPatternRecord {
    pub days: String,
    pub start: String,
    pub end: String,
}

impl MeetingPattern {
    pub const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new<I>(days: I, start: NaiveTime, end: NaiveTime) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = Weekday>,
    {
        Self::from_minutes(days, minute_of_day(start), minute_of_day(end))
    }

    pub fn from_minutes<I>(days: I, start_minute: u32, end_minute: u32) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        if days.is_empty() {
            return Err(PatternError::NoDays);
        }
        days.sort_by_key(|wd| wd.num_days_from_monday());
        days.dedup();

        if end_minute >= MINUTES_PER_DAY {
            return Err(PatternError::InvalidTime(format_minutes(end_minute)));
        }
        if start_minute >= end_minute {
            return Err(PatternError::EmptyInterval {
                start: format_minutes(start_minute),
                end: format_minutes(end_minute),
            });
        }

        Ok(Self {
            days,
            start_minute,
            end_minute,
        })
    }

    /// Parse the catalog's textual form, e.g. `("MWF", "09:00", "10:15")`.
    pub fn parse(days: &str, start: &str, end: &str) -> Result<Self, PatternError> {
        let days = parse_days(days)?;
        let start = parse_time(start)?;
        let end = parse_time(end)?;
        Self::from_minutes(days, start, end)
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    pub fn meets_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn start_minute(&self) -> u32 {
        self.start_minute
    }

    pub fn end_minute(&self) -> u32 {
        self.end_minute
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute - self.start_minute
    }

    /// Day codes in Mon..Sun order, e.g. `"MWF"`.
    pub fn day_codes(&self) -> String {
        self.days.iter().map(|day| day_code(*day)).collect()
    }

    pub fn start_text(&self) -> String {
        format_minutes(self.start_minute)
    }

    pub fn end_text(&self) -> String {
        format_minutes(self.end_minute)
    }

    pub fn to_record(&self) -> MeetingPatternRecord {
        MeetingPatternRecord::from(self.clone())
    }
}

impl fmt::Display for MeetingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day_codes(),
            self.start_text(),
            self.end_text()
        )
    }
}

impl TryFrom<MeetingPatternRecord> for MeetingPattern {
    type Error = PatternError;

    fn try_from(record: MeetingPatternRecord) -> Result<Self, Self::Error> {
        MeetingPattern::parse(&record.days, &record.start, &record.end)
    }
}

impl From<MeetingPattern> for MeetingPatternRecord {
    fn from(pattern: MeetingPattern) -> Self {
        Self {
            days: pattern.day_codes(),
            start: pattern.start_text(),
            end: pattern.end_text(),
        }
    }
}

/// Single-letter code for a weekday. Thursday is `R` and Sunday is `U` so
/// that every code is unique.
pub fn day_code(day: Weekday) -> char {
    match day {
        Weekday::Mon => 'M',
        Weekday::Tue => 'T',
        Weekday::Wed => 'W',
        Weekday::Thu => 'R',
        Weekday::Fri => 'F',
        Weekday::Sat => 'S',
        Weekday::Sun => 'U',
    }
}

pub fn weekday_from_code(code: char) -> Option<Weekday> {
    match code.to_ascii_uppercase() {
        'M' => Some(Weekday::Mon),
        'T' => Some(Weekday::Tue),
        'W' => Some(Weekday::Wed),
        'R' => Some(Weekday::Thu),
        'F' => Some(Weekday::Fri),
        'S' => Some(Weekday::Sat),
        'U' => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn parse_days(input: &str) -> Result<Vec<Weekday>, PatternError> {
    let mut days = Vec::new();
    for code in input.chars().filter(|c| !c.is_whitespace()) {
        let day = weekday_from_code(code).ok_or(PatternError::UnknownDay(code))?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        return Err(PatternError::NoDays);
    }
    Ok(days)
}

/// Parse `HH:mm` into minutes since midnight.
pub fn parse_time(input: &str) -> Result<u32, PatternError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map(minute_of_day)
        .map_err(|_| PatternError::InvalidTime(input.trim().to_string()))
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_days_skips_whitespace_and_duplicates() {
        let days = parse_days(" m w M ").unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn format_minutes_pads_both_fields() {
        assert_eq!(format_minutes(9 * 60 + 5), "09:05");
        assert_eq!(format_minutes(0), "00:00");
    }

    #[test]
    fn day_codes_round_trip_through_lookup() {
        for day in MeetingPattern::ALL_WEEKDAYS {
            assert_eq!(weekday_from_code(day_code(day)), Some(day));
        }
    }
}
