use super::{CatalogStore, PersistenceError, PersistenceResult};
use crate::catalog::Catalog;
use crate::directory::{Admin, Professor, Student};
use crate::roster::CourseRoster;
use rusqlite::{Connection, params};
use serde::de::DeserializeOwned;
use std::sync::{Mutex, MutexGuard};

/// Catalog store backed by a single SQLite file. Each record is kept as a
/// JSON document keyed by its id; a save replaces every table inside one
/// transaction.
pub struct SqliteCatalogStore {
    connection: Mutex<Connection>,
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS catalog_marker (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS professors (
                id TEXT PRIMARY KEY,
                professor_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                course_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                student_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS admins (
                position INTEGER PRIMARY KEY,
                admin_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn replace_rows<I>(
        tx: &rusqlite::Transaction,
        table: &str,
        json_column: &str,
        rows: I,
    ) -> PersistenceResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (id, {json_column}) VALUES (?1, ?2)"
        ))?;
        for (id, json) in rows {
            stmt.execute(params![id, json])?;
        }
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(
        conn: &Connection,
        table: &str,
        json_column: &str,
        order_by: &str,
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {json_column} FROM {table} ORDER BY {order_by} ASC"
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn save_catalog(&self, catalog: &Catalog) -> PersistenceResult<()> {
        super::validate_catalog(catalog)?;

        let professors = catalog
            .professors()
            .map(|p| Ok((p.id.clone(), serde_json::to_string(p)?)))
            .collect::<PersistenceResult<Vec<_>>>()?;
        let courses = catalog
            .courses()
            .map(|c| Ok((c.id().to_string(), serde_json::to_string(c)?)))
            .collect::<PersistenceResult<Vec<_>>>()?;
        let students = catalog
            .students()
            .map(|s| Ok((s.id.clone(), serde_json::to_string(s)?)))
            .collect::<PersistenceResult<Vec<_>>>()?;
        let admins = catalog
            .admins()
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::replace_rows(&tx, "professors", "professor_json", professors)?;
        Self::replace_rows(&tx, "courses", "course_json", courses)?;
        Self::replace_rows(&tx, "students", "student_json", students)?;

        tx.execute("DELETE FROM admins", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO admins (position, admin_json) VALUES (?1, ?2)")?;
            for (position, json) in admins.iter().enumerate() {
                stmt.execute(params![position as i64, json])?;
            }
        }

        tx.execute("DELETE FROM catalog_marker", [])?;
        tx.execute(
            "INSERT INTO catalog_marker (id, saved_at) VALUES (1, ?1)",
            params![chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_catalog(&self) -> PersistenceResult<Option<Catalog>> {
        let conn = self.lock()?;

        let saved: i64 = conn.query_row("SELECT COUNT(*) FROM catalog_marker", [], |row| {
            row.get(0)
        })?;
        if saved == 0 {
            return Ok(None);
        }

        let professors: Vec<Professor> =
            Self::load_rows(&conn, "professors", "professor_json", "id")?;
        let courses: Vec<CourseRoster> = Self::load_rows(&conn, "courses", "course_json", "id")?;
        let students: Vec<Student> = Self::load_rows(&conn, "students", "student_json", "id")?;
        let admins: Vec<Admin> = Self::load_rows(&conn, "admins", "admin_json", "position")?;

        let catalog = Catalog::from_parts(courses, students, professors, admins)?;
        super::validate_catalog(&catalog)?;
        Ok(Some(catalog))
    }
}
