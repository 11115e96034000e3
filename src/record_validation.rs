use crate::directory::{Admin, Professor, Student};
use crate::roster::{CourseRoster, RosterError};

/// Separates the fields of every line in the data files.
pub(crate) const FIELD_SEPARATOR: char = ';';
/// Separate the `CID: grade` pairs of a student's enrollment field.
pub(crate) const ENROLLMENT_SEPARATORS: [char; 2] = [',', ':'];

/// Identifiers are stored verbatim and compared exactly, so they may not carry
/// whitespace or any separator the data files use.
pub(crate) fn validate_id(label: &str, value: &str) -> Result<(), RosterError> {
    if value.is_empty() {
        return Err(RosterError::invalid(format!("{label} must not be empty")));
    }
    if let Some(c) = value
        .chars()
        .find(|c| c.is_whitespace() || *c == FIELD_SEPARATOR || ENROLLMENT_SEPARATORS.contains(c))
    {
        return Err(RosterError::invalid(format!(
            "{label} '{value}' must not contain {c:?}"
        )));
    }
    Ok(())
}

/// Any stored field: no field separator, no line breaks, no surrounding
/// whitespace. May be empty.
pub(crate) fn validate_field(label: &str, value: &str) -> Result<(), RosterError> {
    if value.trim() != value {
        return Err(RosterError::invalid(format!(
            "{label} '{value}' must not start or end with whitespace"
        )));
    }
    if value.contains(FIELD_SEPARATOR) || value.contains(['\n', '\r']) {
        return Err(RosterError::invalid(format!(
            "{label} '{value}' must not contain ';' or line breaks"
        )));
    }
    Ok(())
}

/// Names and other required free text.
pub(crate) fn validate_text(label: &str, value: &str) -> Result<(), RosterError> {
    if value.trim().is_empty() {
        return Err(RosterError::invalid(format!("{label} must not be empty")));
    }
    validate_field(label, value)
}

pub(crate) fn validate_grade(grade: &str) -> Result<(), RosterError> {
    validate_text("grade", grade)?;
    if grade.contains(ENROLLMENT_SEPARATORS) {
        return Err(RosterError::invalid(format!(
            "grade '{grade}' must not contain ',' or ':'"
        )));
    }
    Ok(())
}

pub(crate) fn validate_course(course: &CourseRoster) -> Result<(), RosterError> {
    validate_id("course id", course.id())?;
    validate_text("course name", course.name())?;
    validate_id("professor id", course.professor_id())?;
    for student_id in course.enrolled() {
        validate_id("student id", student_id)?;
    }
    Ok(())
}

pub(crate) fn validate_student(student: &Student) -> Result<(), RosterError> {
    validate_id("student id", &student.id)?;
    validate_text("student name", &student.name)?;
    validate_text("username", &student.username)?;
    validate_field("password", &student.password)?;
    for (course_id, grade) in student.courses().iter() {
        validate_id("course id", course_id)?;
        validate_grade(grade)?;
    }
    Ok(())
}

pub(crate) fn validate_professor(professor: &Professor) -> Result<(), RosterError> {
    validate_id("professor id", &professor.id)?;
    validate_text("professor name", &professor.name)?;
    validate_text("username", &professor.username)?;
    validate_field("password", &professor.password)
}

pub(crate) fn validate_admin(admin: &Admin) -> Result<(), RosterError> {
    validate_id("admin id", &admin.id)?;
    validate_text("admin name", &admin.name)?;
    validate_text("username", &admin.username)?;
    validate_field("password", &admin.password)
}
