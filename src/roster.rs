use crate::conflict;
use crate::meeting::{MeetingPattern, PatternError};
use crate::record_validation::{validate_id, validate_text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("course {course_id} is full ({enrolled}/{capacity} seats taken)")]
    CourseFull {
        course_id: String,
        capacity: u32,
        enrolled: usize,
    },
    #[error("student {student_id} is already enrolled in {course_id}")]
    AlreadyEnrolled {
        course_id: String,
        student_id: String,
    },
    #[error("student {student_id} is not enrolled in {course_id}")]
    NotEnrolled {
        course_id: String,
        student_id: String,
    },
    #[error("{course_id} conflicts with {conflicting_course_id} on the student's schedule")]
    ScheduleConflict {
        course_id: String,
        conflicting_course_id: String,
    },
}

impl RosterError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RosterError::InvalidArgument(message.into())
    }
}

impl From<PatternError> for RosterError {
    fn from(err: PatternError) -> Self {
        RosterError::InvalidArgument(err.to_string())
    }
}

/// One course offering: its meeting pattern, seat limit and the students
/// holding a seat.
///
/// Admission is gated on `enrolled < capacity`. Lowering the capacity below
/// the current headcount is accepted and only blocks new admissions until
/// enough students drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRoster {
    id: String,
    name: String,
    professor_id: String,
    pattern: MeetingPattern,
    capacity: u32,
    #[serde(default)]
    enrolled: BTreeSet<String>,
}

impl CourseRoster {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        professor_id: impl Into<String>,
        pattern: MeetingPattern,
        capacity: i32,
    ) -> Result<Self, RosterError> {
        let id = id.into();
        let name = name.into().trim().to_string();
        let professor_id = professor_id.into();
        validate_id("course id", &id)?;
        validate_text("course name", &name)?;
        validate_id("professor id", &professor_id)?;
        let capacity = checked_capacity(&id, capacity)?;
        Ok(Self {
            id,
            name,
            professor_id,
            pattern,
            capacity,
            enrolled: BTreeSet::new(),
        })
    }

    /// Build a roster from the catalog's textual record fields.
    pub fn parse(
        id: impl Into<String>,
        name: impl Into<String>,
        professor_id: impl Into<String>,
        days: &str,
        start: &str,
        end: &str,
        capacity: i32,
    ) -> Result<Self, RosterError> {
        let pattern = MeetingPattern::parse(days, start, end)?;
        Self::new(id, name, professor_id, pattern, capacity)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn professor_id(&self) -> &str {
        &self.professor_id
    }

    pub fn pattern(&self) -> &MeetingPattern {
        &self.pattern
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn enrolled(&self) -> impl Iterator<Item = &str> {
        self.enrolled.iter().map(String::as_str)
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled.len()
    }

    pub fn is_enrolled(&self, student_id: &str) -> bool {
        self.enrolled.contains(student_id)
    }

    pub fn seats_left(&self) -> u32 {
        let taken = u32::try_from(self.enrolled.len()).unwrap_or(u32::MAX);
        self.capacity.saturating_sub(taken)
    }

    pub fn has_room(&self) -> bool {
        self.enrolled.len() < self.capacity as usize
    }

    pub fn is_full(&self) -> bool {
        !self.has_room()
    }

    pub fn is_over_capacity(&self) -> bool {
        self.enrolled.len() > self.capacity as usize
    }

    pub fn can_enroll(&self, student_id: &str) -> bool {
        !self.is_enrolled(student_id) && self.has_room()
    }

    /// Admit `student_id` exactly as given; ids are never trimmed or
    /// otherwise rewritten here.
    pub fn enroll(&mut self, student_id: &str) -> Result<(), RosterError> {
        validate_id("student id", student_id)?;
        if self.is_enrolled(student_id) {
            return Err(RosterError::AlreadyEnrolled {
                course_id: self.id.clone(),
                student_id: student_id.to_string(),
            });
        }
        if !self.has_room() {
            tracing::debug!(
                course = %self.id,
                capacity = self.capacity,
                enrolled = self.enrolled.len(),
                "rejecting enrollment, course is full"
            );
            return Err(RosterError::CourseFull {
                course_id: self.id.clone(),
                capacity: self.capacity,
                enrolled: self.enrolled.len(),
            });
        }
        self.enrolled.insert(student_id.to_string());
        debug_assert!(self.enrolled.len() <= self.capacity as usize);
        Ok(())
    }

    pub fn drop_student(&mut self, student_id: &str) -> Result<(), RosterError> {
        if self.enrolled.remove(student_id) {
            Ok(())
        } else {
            Err(RosterError::NotEnrolled {
                course_id: self.id.clone(),
                student_id: student_id.to_string(),
            })
        }
    }

    pub fn conflicts_with(&self, other: &MeetingPattern) -> bool {
        conflict::conflicts(&self.pattern, other)
    }

    pub fn set_pattern(&mut self, pattern: MeetingPattern) {
        self.pattern = pattern;
    }

    pub fn set_capacity(&mut self, capacity: i32) -> Result<(), RosterError> {
        self.capacity = checked_capacity(&self.id, capacity)?;
        if self.is_over_capacity() {
            tracing::warn!(
                course = %self.id,
                capacity = self.capacity,
                enrolled = self.enrolled.len(),
                "capacity lowered below current enrollment; no students were removed"
            );
        }
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), RosterError> {
        let name = name.into().trim().to_string();
        validate_text("course name", &name)?;
        self.name = name;
        Ok(())
    }

    pub(crate) fn set_professor(&mut self, professor_id: impl Into<String>) {
        self.professor_id = professor_id.into();
    }

    /// Re-admit a student from persisted state without the capacity gate.
    pub(crate) fn restore_member(&mut self, student_id: &str) -> bool {
        self.enrolled.insert(student_id.to_string())
    }

    pub(crate) fn take_enrolled(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.enrolled)
    }
}

fn checked_capacity(course_id: &str, capacity: i32) -> Result<u32, RosterError> {
    u32::try_from(capacity).map_err(|_| {
        RosterError::invalid(format!(
            "course {course_id} capacity must be non-negative (got {capacity})"
        ))
    })
}
