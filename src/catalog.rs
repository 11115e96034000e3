use crate::directory::{Admin, NOT_GRADED, Professor, ProfileUpdate, Student};
use crate::meeting::MeetingPattern;
use crate::record_validation::{
    validate_admin, validate_course, validate_grade, validate_professor, validate_student,
};
use crate::roster::{CourseRoster, RosterError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("course {0} not found")]
    UnknownCourse(String),
    #[error("student {0} not found")]
    UnknownStudent(String),
    #[error("professor {0} not found")]
    UnknownProfessor(String),
    #[error("course {0} already exists")]
    DuplicateCourse(String),
    #[error("student {0} already exists")]
    DuplicateStudent(String),
    #[error("username {0} is already taken")]
    DuplicateUsername(String),
    #[error("professor {0} already exists")]
    DuplicateProfessor(String),
    #[error(
        "professor {professor_id} already teaches {conflicting_course_id} at the time requested for {course_id}"
    )]
    ProfessorBusy {
        professor_id: String,
        course_id: String,
        conflicting_course_id: String,
    },
    #[error("professor {professor_id} still teaches {}", .course_ids.join(", "))]
    ProfessorAssigned {
        professor_id: String,
        course_ids: Vec<String>,
    },
    #[error("inconsistent catalog: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::UnknownCourse(_)
                | CatalogError::UnknownStudent(_)
                | CatalogError::UnknownProfessor(_)
        )
    }
}

/// Result of a successful enrollment, handed back to the caller for display
/// and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentOutcome {
    pub student_id: String,
    pub course_id: String,
    pub seats_left: u32,
}

/// The full set of courses, students, professors and admins for one session.
///
/// Every enrollment lives in two places: the course roster and the student's
/// enrollment index. All mutations here update both or neither.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: BTreeMap<String, CourseRoster>,
    students: BTreeMap<String, Student>,
    professors: BTreeMap<String, Professor>,
    admins: Vec<Admin>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from stored records.
    ///
    /// Rosters are re-derived from the students' enrollment indices. Entries
    /// naming unknown courses are discarded, and rosters may come back over
    /// capacity when the limit was lowered after students enrolled. Records
    /// with malformed ids, names or grades are refused.
    pub fn from_parts<C, S, P, A>(
        courses: C,
        students: S,
        professors: P,
        admins: A,
    ) -> Result<Self, CatalogError>
    where
        C: IntoIterator<Item = CourseRoster>,
        S: IntoIterator<Item = Student>,
        P: IntoIterator<Item = Professor>,
        A: IntoIterator<Item = Admin>,
    {
        let mut catalog = Catalog::new();
        for professor in professors {
            catalog.add_professor(professor)?;
        }
        for admin in admins {
            catalog.add_admin(admin)?;
        }

        let mut previous_members: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for mut course in courses {
            validate_course(&course)?;
            if catalog.courses.contains_key(course.id()) {
                return Err(CatalogError::DuplicateCourse(course.id().to_string()));
            }
            if !catalog.professors.contains_key(course.professor_id()) {
                return Err(CatalogError::UnknownProfessor(
                    course.professor_id().to_string(),
                ));
            }
            previous_members.insert(course.id().to_string(), course.take_enrolled());
            catalog.courses.insert(course.id().to_string(), course);
        }

        for mut student in students {
            validate_student(&student)?;
            if catalog.students.contains_key(&student.id) {
                return Err(CatalogError::DuplicateStudent(student.id));
            }
            let listed: Vec<String> = student.courses.course_ids().map(str::to_string).collect();
            for course_id in listed {
                match catalog.courses.get_mut(&course_id) {
                    Some(course) => {
                        course.restore_member(&student.id);
                    }
                    None => {
                        tracing::warn!(
                            student = %student.id,
                            course = %course_id,
                            "dropping enrollment record for unknown course"
                        );
                        student.courses.remove(&course_id);
                    }
                }
            }
            catalog.students.insert(student.id.clone(), student);
        }

        for (course_id, members) in previous_members {
            let Some(course) = catalog.courses.get(&course_id) else {
                continue;
            };
            for member in members.iter().filter(|m| !course.is_enrolled(m)) {
                tracing::warn!(
                    course = %course_id,
                    student = %member,
                    "dropping roster seat with no matching student enrollment"
                );
            }
            if course.is_over_capacity() {
                tracing::warn!(
                    course = %course_id,
                    capacity = course.capacity(),
                    enrolled = course.enrolled_count(),
                    "course loaded over capacity"
                );
            }
        }

        Ok(catalog)
    }

    pub fn courses(&self) -> impl Iterator<Item = &CourseRoster> {
        self.courses.values()
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub fn professors(&self) -> impl Iterator<Item = &Professor> {
        self.professors.values()
    }

    pub fn admins(&self) -> &[Admin] {
        &self.admins
    }

    pub fn course(&self, course_id: &str) -> Result<&CourseRoster, CatalogError> {
        self.courses
            .get(course_id)
            .ok_or_else(|| CatalogError::UnknownCourse(course_id.to_string()))
    }

    pub fn student(&self, student_id: &str) -> Result<&Student, CatalogError> {
        self.students
            .get(student_id)
            .ok_or_else(|| CatalogError::UnknownStudent(student_id.to_string()))
    }

    pub fn professor(&self, professor_id: &str) -> Result<&Professor, CatalogError> {
        self.professors
            .get(professor_id)
            .ok_or_else(|| CatalogError::UnknownProfessor(professor_id.to_string()))
    }

    pub fn professor_by_name(&self, name: &str) -> Option<&Professor> {
        self.professors.values().find(|p| p.name.trim() == name.trim())
    }

    pub fn courses_taught_by(&self, professor_id: &str) -> Vec<&CourseRoster> {
        self.courses
            .values()
            .filter(|course| course.professor_id() == professor_id)
            .collect()
    }

    /// Students holding a seat in the course, in id order.
    pub fn roster_of(&self, course_id: &str) -> Result<Vec<&Student>, CatalogError> {
        let course = self.course(course_id)?;
        Ok(course
            .enrolled()
            .filter_map(|student_id| self.students.get(student_id))
            .collect())
    }

    /// Courses on a student's schedule, paired with the recorded grade.
    pub fn schedule_of(
        &self,
        student_id: &str,
    ) -> Result<Vec<(&CourseRoster, &str)>, CatalogError> {
        let student = self.student(student_id)?;
        Ok(student
            .courses
            .iter()
            .filter_map(|(course_id, grade)| self.courses.get(course_id).map(|c| (c, grade)))
            .collect())
    }

    /// Courses already on the student's schedule that collide with `course_id`.
    pub fn conflicts_for(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Vec<String>, CatalogError> {
        let student = self.student(student_id)?;
        let candidate = self.course(course_id)?;
        Ok(self.schedule_conflicts(student, candidate))
    }

    fn schedule_conflicts(&self, student: &Student, candidate: &CourseRoster) -> Vec<String> {
        student
            .courses
            .course_ids()
            .filter(|id| *id != candidate.id())
            .filter_map(|id| self.courses.get(id))
            .filter(|existing| candidate.conflicts_with(existing.pattern()))
            .map(|existing| existing.id().to_string())
            .collect()
    }

    fn professor_conflict(
        &self,
        professor_id: &str,
        pattern: &MeetingPattern,
        course_id: &str,
    ) -> Option<String> {
        self.courses
            .values()
            .filter(|course| course.professor_id() == professor_id && course.id() != course_id)
            .find(|course| course.conflicts_with(pattern))
            .map(|course| course.id().to_string())
    }

    /// Admit a student after checking their existing schedule for clashes.
    pub fn enroll(
        &mut self,
        student_id: &str,
        course_id: &str,
    ) -> Result<EnrollmentOutcome, CatalogError> {
        let student = self.student(student_id)?;
        let candidate = self.course(course_id)?;

        if student.courses.contains(course_id) || candidate.is_enrolled(student_id) {
            return Err(RosterError::AlreadyEnrolled {
                course_id: course_id.to_string(),
                student_id: student_id.to_string(),
            }
            .into());
        }

        if let Some(conflicting) = self.schedule_conflicts(student, candidate).into_iter().next() {
            tracing::debug!(
                student = %student_id,
                course = %course_id,
                conflicting = %conflicting,
                "rejecting enrollment, schedule conflict"
            );
            return Err(RosterError::ScheduleConflict {
                course_id: course_id.to_string(),
                conflicting_course_id: conflicting,
            }
            .into());
        }

        let course = self
            .courses
            .get_mut(course_id)
            .ok_or_else(|| CatalogError::UnknownCourse(course_id.to_string()))?;
        course.enroll(student_id)?;
        let seats_left = course.seats_left();

        if let Some(student) = self.students.get_mut(student_id) {
            student.courses.insert(course_id, NOT_GRADED);
        }

        tracing::info!(student = %student_id, course = %course_id, seats_left, "enrolled");
        Ok(EnrollmentOutcome {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            seats_left,
        })
    }

    /// Remove a student from a course, releasing the seat.
    pub fn drop_enrollment(&mut self, student_id: &str, course_id: &str) -> Result<(), CatalogError> {
        let student = self.student(student_id)?;
        let course = self.course(course_id)?;
        if !student.courses.contains(course_id) || !course.is_enrolled(student_id) {
            return Err(RosterError::NotEnrolled {
                course_id: course_id.to_string(),
                student_id: student_id.to_string(),
            }
            .into());
        }

        if let Some(course) = self.courses.get_mut(course_id) {
            course.drop_student(student_id)?;
        }
        if let Some(student) = self.students.get_mut(student_id) {
            student.courses.remove(course_id);
        }
        tracing::info!(student = %student_id, course = %course_id, "dropped");
        Ok(())
    }

    pub fn set_grade(
        &mut self,
        student_id: &str,
        course_id: &str,
        grade: &str,
    ) -> Result<(), CatalogError> {
        let grade = grade.trim();
        validate_grade(grade)?;
        let student = self
            .students
            .get_mut(student_id)
            .ok_or_else(|| CatalogError::UnknownStudent(student_id.to_string()))?;
        if !student.courses.set_grade(course_id, grade) {
            return Err(RosterError::NotEnrolled {
                course_id: course_id.to_string(),
                student_id: student_id.to_string(),
            }
            .into());
        }
        tracing::info!(student = %student_id, course = %course_id, grade, "grade recorded");
        Ok(())
    }

    pub fn add_course(&mut self, course: CourseRoster) -> Result<(), CatalogError> {
        if self.courses.contains_key(course.id()) {
            return Err(CatalogError::DuplicateCourse(course.id().to_string()));
        }
        self.professor(course.professor_id())?;
        if let Some(conflicting) =
            self.professor_conflict(course.professor_id(), course.pattern(), course.id())
        {
            return Err(CatalogError::ProfessorBusy {
                professor_id: course.professor_id().to_string(),
                course_id: course.id().to_string(),
                conflicting_course_id: conflicting,
            });
        }
        if course.enrolled_count() > 0 {
            return Err(RosterError::invalid(format!(
                "course {} must be added with an empty roster",
                course.id()
            ))
            .into());
        }
        tracing::info!(course = %course.id(), professor = %course.professor_id(), "course added");
        self.courses.insert(course.id().to_string(), course);
        Ok(())
    }

    pub fn rename_course(&mut self, course_id: &str, name: &str) -> Result<(), CatalogError> {
        let course = self
            .courses
            .get_mut(course_id)
            .ok_or_else(|| CatalogError::UnknownCourse(course_id.to_string()))?;
        course.rename(name)?;
        Ok(())
    }

    pub fn assign_professor(
        &mut self,
        course_id: &str,
        professor_id: &str,
    ) -> Result<(), CatalogError> {
        self.professor(professor_id)?;
        let pattern = self.course(course_id)?.pattern().clone();
        if let Some(conflicting) = self.professor_conflict(professor_id, &pattern, course_id) {
            return Err(CatalogError::ProfessorBusy {
                professor_id: professor_id.to_string(),
                course_id: course_id.to_string(),
                conflicting_course_id: conflicting,
            });
        }
        if let Some(course) = self.courses.get_mut(course_id) {
            course.set_professor(professor_id);
        }
        tracing::info!(course = %course_id, professor = %professor_id, "professor reassigned");
        Ok(())
    }

    /// Move a course to a new meeting time.
    ///
    /// The professor's other courses must not collide with the new time.
    /// Students already enrolled keep their seats even if the move creates a
    /// clash on their schedule; the clash only blocks future enrollments.
    pub fn set_course_pattern(
        &mut self,
        course_id: &str,
        pattern: MeetingPattern,
    ) -> Result<(), CatalogError> {
        let professor_id = self.course(course_id)?.professor_id().to_string();
        if let Some(conflicting) = self.professor_conflict(&professor_id, &pattern, course_id) {
            return Err(CatalogError::ProfessorBusy {
                professor_id,
                course_id: course_id.to_string(),
                conflicting_course_id: conflicting,
            });
        }
        if let Some(course) = self.courses.get_mut(course_id) {
            let previous = course.pattern().to_string();
            tracing::info!(course = %course_id, %previous, current = %pattern, "meeting time changed");
            course.set_pattern(pattern);
        }
        Ok(())
    }

    pub fn set_course_capacity(&mut self, course_id: &str, capacity: i32) -> Result<(), CatalogError> {
        let course = self
            .courses
            .get_mut(course_id)
            .ok_or_else(|| CatalogError::UnknownCourse(course_id.to_string()))?;
        course.set_capacity(capacity)?;
        tracing::info!(course = %course_id, capacity, "capacity changed");
        Ok(())
    }

    /// Remove a course and every student's enrollment in it. Returns the ids
    /// of the students who lost the course.
    pub fn delete_course(&mut self, course_id: &str) -> Result<Vec<String>, CatalogError> {
        let mut course = self
            .courses
            .remove(course_id)
            .ok_or_else(|| CatalogError::UnknownCourse(course_id.to_string()))?;
        let affected: Vec<String> = course.take_enrolled().into_iter().collect();
        for student_id in &affected {
            if let Some(student) = self.students.get_mut(student_id) {
                student.courses.remove(course_id);
            }
        }
        tracing::info!(course = %course_id, affected = affected.len(), "course deleted");
        Ok(affected)
    }

    /// Register a student. Ids and other fields are stored exactly as given, so
    /// padded or separator-bearing values are refused rather than rewritten.
    pub fn add_student(&mut self, student: Student) -> Result<(), CatalogError> {
        validate_student(&student)?;
        if self.students.contains_key(&student.id) {
            return Err(CatalogError::DuplicateStudent(student.id));
        }
        if self.students.values().any(|s| s.username == student.username) {
            return Err(CatalogError::DuplicateUsername(student.username));
        }
        if !student.courses.is_empty() {
            return Err(RosterError::invalid(format!(
                "student {} must be added before enrolling in courses",
                student.id
            ))
            .into());
        }
        tracing::info!(student = %student.id, "student added");
        self.students.insert(student.id.clone(), student);
        Ok(())
    }

    /// Delete a student and release every seat they held.
    pub fn remove_student(&mut self, student_id: &str) -> Result<Student, CatalogError> {
        let student = self
            .students
            .remove(student_id)
            .ok_or_else(|| CatalogError::UnknownStudent(student_id.to_string()))?;
        for course_id in student.courses.course_ids() {
            let released = self
                .courses
                .get_mut(course_id)
                .is_some_and(|course| course.drop_student(student_id).is_ok());
            if !released {
                tracing::warn!(student = %student_id, course = %course_id, "no roster seat to release");
            }
        }
        tracing::info!(student = %student_id, "student removed");
        Ok(student)
    }

    /// Change a student's name or credentials. Blank fields keep their
    /// current value; the id and enrollments are untouched.
    pub fn update_student(
        &mut self,
        student_id: &str,
        update: &ProfileUpdate,
    ) -> Result<&Student, CatalogError> {
        let mut edited = self.student(student_id)?.clone();
        update.apply(&mut edited.name, &mut edited.username, &mut edited.password);
        validate_student(&edited)?;
        if self
            .students
            .values()
            .any(|s| s.id != edited.id && s.username == edited.username)
        {
            return Err(CatalogError::DuplicateUsername(edited.username));
        }
        tracing::info!(student = %student_id, "student updated");
        self.students.insert(student_id.to_string(), edited);
        self.student(student_id)
    }

    pub fn add_professor(&mut self, professor: Professor) -> Result<(), CatalogError> {
        validate_professor(&professor)?;
        if self.professors.contains_key(&professor.id) {
            return Err(CatalogError::DuplicateProfessor(professor.id));
        }
        self.professors.insert(professor.id.clone(), professor);
        Ok(())
    }

    /// Change a professor's name or credentials. Blank fields keep their
    /// current value. Course records follow the professor by id, so a rename
    /// carries over to every course they teach.
    pub fn update_professor(
        &mut self,
        professor_id: &str,
        update: &ProfileUpdate,
    ) -> Result<&Professor, CatalogError> {
        let mut edited = self.professor(professor_id)?.clone();
        update.apply(&mut edited.name, &mut edited.username, &mut edited.password);
        validate_professor(&edited)?;
        let others = self.professors.values().filter(|p| p.id != edited.id);
        for other in others {
            if other.username == edited.username {
                return Err(CatalogError::DuplicateUsername(edited.username));
            }
            // The course file names the professor, not the id.
            if other.name == edited.name {
                return Err(CatalogError::DuplicateProfessor(edited.name));
            }
        }
        tracing::info!(professor = %professor_id, "professor updated");
        self.professors.insert(professor_id.to_string(), edited);
        self.professor(professor_id)
    }

    pub fn remove_professor(&mut self, professor_id: &str) -> Result<Professor, CatalogError> {
        self.professor(professor_id)?;
        let course_ids: Vec<String> = self
            .courses_taught_by(professor_id)
            .into_iter()
            .map(|course| course.id().to_string())
            .collect();
        if !course_ids.is_empty() {
            return Err(CatalogError::ProfessorAssigned {
                professor_id: professor_id.to_string(),
                course_ids,
            });
        }
        self.professors
            .remove(professor_id)
            .ok_or_else(|| CatalogError::UnknownProfessor(professor_id.to_string()))
    }

    pub fn add_admin(&mut self, admin: Admin) -> Result<(), CatalogError> {
        validate_admin(&admin)?;
        self.admins.push(admin);
        Ok(())
    }

    /// Check that rosters and enrollment indices agree and that every course
    /// points at a known professor.
    pub fn verify_consistency(&self) -> Result<(), CatalogError> {
        for course in self.courses.values() {
            if !self.professors.contains_key(course.professor_id()) {
                return Err(CatalogError::Inconsistent(format!(
                    "course {} references unknown professor {}",
                    course.id(),
                    course.professor_id()
                )));
            }
            for student_id in course.enrolled() {
                let listed = self
                    .students
                    .get(student_id)
                    .is_some_and(|s| s.courses.contains(course.id()));
                if !listed {
                    return Err(CatalogError::Inconsistent(format!(
                        "student {student_id} holds a seat in {} without an enrollment record",
                        course.id()
                    )));
                }
            }
        }
        for student in self.students.values() {
            for course_id in student.courses.course_ids() {
                let seated = self
                    .courses
                    .get(course_id)
                    .is_some_and(|c| c.is_enrolled(&student.id));
                if !seated {
                    return Err(CatalogError::Inconsistent(format!(
                        "student {} lists {course_id} without a roster seat",
                        student.id
                    )));
                }
            }
        }
        Ok(())
    }
}
