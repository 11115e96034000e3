use super::{CatalogStore, PersistenceError, PersistenceResult};
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::directory::{Admin, EnrollmentIndex, Professor, Student};
use crate::roster::CourseRoster;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct CatalogSnapshot {
    courses: Vec<CourseRoster>,
    students: Vec<Student>,
    professors: Vec<Professor>,
    #[serde(default)]
    admins: Vec<Admin>,
}

impl CatalogSnapshot {
    fn from_catalog(catalog: &Catalog) -> PersistenceResult<Self> {
        super::validate_catalog(catalog)?;
        Ok(Self {
            courses: catalog.courses().cloned().collect(),
            students: catalog.students().cloned().collect(),
            professors: catalog.professors().cloned().collect(),
            admins: catalog.admins().to_vec(),
        })
    }

    fn into_catalog(self) -> PersistenceResult<Catalog> {
        Ok(Catalog::from_parts(
            self.courses,
            self.students,
            self.professors,
            self.admins,
        )?)
    }
}

pub fn save_catalog_to_json<P: AsRef<Path>>(catalog: &Catalog, path: P) -> PersistenceResult<()> {
    let snapshot = CatalogSnapshot::from_catalog(catalog)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Catalog> {
    let file = File::open(path)?;
    let snapshot: CatalogSnapshot = serde_json::from_reader(file)?;
    snapshot.into_catalog()
}

/// The four `;`-delimited text files the catalog has always been kept in.
///
/// Line layouts:
/// - courses: `id; name; professor name; days; start; end; capacity`
/// - students: `id; name; username; password[; CID: grade, CID: grade]`
/// - professors: `name; id; username; password`
/// - admins: `id; name; username; password`
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    course_path: PathBuf,
    student_path: PathBuf,
    professor_path: PathBuf,
    admin_path: PathBuf,
}

impl FlatFileStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let config = AppConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..AppConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            course_path: config.course_path(),
            student_path: config.student_path(),
            professor_path: config.professor_path(),
            admin_path: config.admin_path(),
        }
    }

    pub fn course_path(&self) -> &Path {
        &self.course_path
    }

    pub fn student_path(&self) -> &Path {
        &self.student_path
    }

    fn read_lines(path: &Path) -> PersistenceResult<Vec<(usize, StringRecord)>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_path(path)?;
        let mut lines = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            lines.push((idx + 1, record));
        }
        Ok(lines)
    }

    fn write_lines<I>(path: &Path, lines: I) -> PersistenceResult<()>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .from_path(path)?;
        for line in lines {
            writer.write_record(&line)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Replace every file in `files` or none of them. Each file is first
    /// written next to its target as `<name>.tmp`; the targets are only
    /// renamed over once all staging writes have succeeded.
    fn replace_files(files: Vec<(&Path, Vec<Vec<String>>)>) -> PersistenceResult<()> {
        let mut staged: Vec<(&Path, PathBuf)> = Vec::with_capacity(files.len());
        for (path, lines) in files {
            let staging = staging_path(path);
            if let Err(err) = Self::write_lines(&staging, lines) {
                for (_, leftover) in &staged {
                    if let Err(e) = std::fs::remove_file(leftover) {
                        tracing::warn!(path = %leftover.display(), error = %e, "could not remove staged file");
                    }
                }
                if staging.is_file() {
                    std::fs::remove_file(&staging)?;
                }
                return Err(err);
            }
            staged.push((path, staging));
        }
        for (path, staging) in staged {
            std::fs::rename(&staging, path)?;
        }
        Ok(())
    }

    fn read_professors(&self) -> PersistenceResult<Vec<Professor>> {
        let mut professors = Vec::new();
        for (line_no, record) in Self::read_lines(&self.professor_path)? {
            if record.len() != 4 {
                tracing::warn!(path = %self.professor_path.display(), line = line_no, "skipping malformed professor line");
                continue;
            }
            professors.push(Professor::new(&record[1], &record[0], &record[2], &record[3]));
        }
        Ok(professors)
    }

    fn read_admins(&self) -> PersistenceResult<Vec<Admin>> {
        let mut admins = Vec::new();
        for (line_no, record) in Self::read_lines(&self.admin_path)? {
            if record.len() != 4 {
                tracing::warn!(path = %self.admin_path.display(), line = line_no, "skipping malformed admin line");
                continue;
            }
            admins.push(Admin::new(&record[0], &record[1], &record[2], &record[3]));
        }
        Ok(admins)
    }

    fn read_courses(&self, professors: &[Professor]) -> PersistenceResult<Vec<CourseRoster>> {
        let professor_ids: HashMap<&str, &str> = professors
            .iter()
            .map(|p| (p.name.as_str(), p.id.as_str()))
            .collect();

        let mut courses = Vec::new();
        for (line_no, record) in Self::read_lines(&self.course_path)? {
            if record.len() != 7 {
                tracing::warn!(path = %self.course_path.display(), line = line_no, "skipping malformed course line");
                continue;
            }
            let Some(professor_id) = professor_ids.get(&record[2]) else {
                tracing::warn!(
                    course = &record[0],
                    professor = &record[2],
                    "skipping course taught by unknown professor"
                );
                continue;
            };
            let capacity = record[6].parse::<i32>().map_err(|e| {
                PersistenceError::InvalidData(format!(
                    "{} line {line_no}: invalid capacity '{}': {e}",
                    self.course_path.display(),
                    &record[6]
                ))
            })?;
            let course = CourseRoster::parse(
                &record[0],
                &record[1],
                *professor_id,
                &record[3],
                &record[4],
                &record[5],
                capacity,
            )
            .map_err(|e| {
                PersistenceError::InvalidData(format!(
                    "{} line {line_no}: {e}",
                    self.course_path.display()
                ))
            })?;
            courses.push(course);
        }
        Ok(courses)
    }

    fn read_students(&self) -> PersistenceResult<Vec<Student>> {
        let mut students = Vec::new();
        for (line_no, record) in Self::read_lines(&self.student_path)? {
            if record.len() < 4 {
                tracing::warn!(path = %self.student_path.display(), line = line_no, "skipping malformed student line");
                continue;
            }
            let courses = record.get(4).map(parse_enrollments).unwrap_or_default();
            students.push(
                Student::new(&record[0], &record[1], &record[2], &record[3]).with_courses(courses),
            );
        }
        Ok(students)
    }
}

impl CatalogStore for FlatFileStore {
    fn save_catalog(&self, catalog: &Catalog) -> PersistenceResult<()> {
        super::validate_catalog(catalog)?;

        let professor_lines: Vec<Vec<String>> = catalog
            .professors()
            .map(|p| vec![p.name.clone(), p.id.clone(), p.username.clone(), p.password.clone()])
            .collect();

        let mut course_lines = Vec::new();
        for course in catalog.courses() {
            let professor = catalog.professor(course.professor_id())?;
            course_lines.push(vec![
                course.id().to_string(),
                course.name().to_string(),
                professor.name.clone(),
                course.pattern().day_codes(),
                course.pattern().start_text(),
                course.pattern().end_text(),
                course.capacity().to_string(),
            ]);
        }

        let student_lines: Vec<Vec<String>> = catalog
            .students()
            .map(|s| {
                let mut line = vec![s.id.clone(), s.name.clone(), s.username.clone(), s.password.clone()];
                if !s.courses().is_empty() {
                    line.push(format_enrollments(s.courses()));
                }
                line
            })
            .collect();

        let admin_lines: Vec<Vec<String>> = catalog
            .admins()
            .iter()
            .map(|a| vec![a.id.clone(), a.name.clone(), a.username.clone(), a.password.clone()])
            .collect();

        Self::replace_files(vec![
            (self.professor_path.as_path(), professor_lines),
            (self.course_path.as_path(), course_lines),
            (self.student_path.as_path(), student_lines),
            (self.admin_path.as_path(), admin_lines),
        ])?;

        tracing::debug!(path = %self.course_path.display(), "catalog saved");
        Ok(())
    }

    fn load_catalog(&self) -> PersistenceResult<Option<Catalog>> {
        if !self.course_path.exists() {
            return Ok(None);
        }
        let professors = self.read_professors()?;
        let courses = self.read_courses(&professors)?;
        let students = self.read_students()?;
        let admins = self.read_admins()?;
        tracing::debug!(
            courses = courses.len(),
            students = students.len(),
            professors = professors.len(),
            "catalog loaded"
        );
        Ok(Some(Catalog::from_parts(courses, students, professors, admins)?))
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// `CID: grade, CID: grade` into an index. Pairs without a colon are ignored.
fn parse_enrollments(field: &str) -> EnrollmentIndex {
    field
        .split(',')
        .filter_map(|pair| {
            let (course, grade) = pair.split_once(':')?;
            let (course, grade) = (course.trim(), grade.trim());
            (!course.is_empty() && !grade.is_empty()).then(|| (course.to_string(), grade.to_string()))
        })
        .collect()
}

fn format_enrollments(index: &EnrollmentIndex) -> String {
    index
        .iter()
        .map(|(course, grade)| format!("{course}: {grade}"))
        .collect::<Vec<_>>()
        .join(", ")
}
