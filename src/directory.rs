use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status recorded for a course the student has joined but not finished.
pub const NOT_GRADED: &str = "Not Graded";

/// Per-student map of course id to grade or status.
///
/// Every entry mirrors a seat in that course's roster; the catalog keeps both
/// sides in step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentIndex {
    entries: BTreeMap<String, String>,
}

impl EnrollmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, course_id: &str) -> bool {
        self.entries.contains_key(course_id)
    }

    pub fn grade(&self, course_id: &str) -> Option<&str> {
        self.entries.get(course_id).map(String::as_str)
    }

    pub fn course_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(course, grade)| (course.as_str(), grade.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, course_id: impl Into<String>, grade: impl Into<String>) {
        self.entries.insert(course_id.into(), grade.into());
    }

    pub(crate) fn remove(&mut self, course_id: &str) -> Option<String> {
        self.entries.remove(course_id)
    }

    pub(crate) fn set_grade(&mut self, course_id: &str, grade: impl Into<String>) -> bool {
        match self.entries.get_mut(course_id) {
            Some(slot) => {
                *slot = grade.into();
                true
            }
            None => false,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EnrollmentIndex
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(course, grade)| (course.into(), grade.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Login name, carried for the persistence layer only.
    pub username: String,
    /// Stored as found in the data files; never checked here.
    pub password: String,
    #[serde(default)]
    pub(crate) courses: EnrollmentIndex,
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            username: username.into(),
            password: password.into(),
            courses: EnrollmentIndex::new(),
        }
    }

    /// Attach an enrollment index read from storage. The catalog reconciles
    /// it against the rosters when the student is loaded.
    pub fn with_courses(mut self, courses: EnrollmentIndex) -> Self {
        self.courses = courses;
        self
    }

    pub fn courses(&self) -> &EnrollmentIndex {
        &self.courses
    }
}

/// Profile edits for a student or professor. `None` or a blank value keeps the
/// current field; anything else replaces it, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.username, &self.password]
            .into_iter()
            .all(|field| replacement(field).is_none())
    }

    pub(crate) fn apply(&self, name: &mut String, username: &mut String, password: &mut String) {
        if let Some(value) = replacement(&self.name) {
            *name = value.to_string();
        }
        if let Some(value) = replacement(&self.username) {
            *username = value.to_string();
        }
        if let Some(value) = replacement(&self.password) {
            *password = value.to_string();
        }
    }
}

fn replacement(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
}

impl Professor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
}

impl Admin {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}
