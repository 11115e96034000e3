use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Catalog, CatalogError, CatalogStore, CourseRoster, EnrollmentOutcome, MeetingPattern,
    Professor, ProfileUpdate, RosterError, Student,
};

type SharedStore = Arc<dyn CatalogStore + Send + Sync>;

/// Orders snapshot writes so an older catalog never overwrites a newer one.
#[derive(Default)]
struct SaveTracker {
    generation: AtomicU64,
    last_saved: Mutex<u64>,
}

/// A catalog copy taken under the write lock, written once the lock is gone.
struct PendingSave {
    store: SharedStore,
    tracker: Arc<SaveTracker>,
    generation: u64,
    catalog: Catalog,
}

impl PendingSave {
    fn write(self) {
        let mut last_saved = self.tracker.last_saved.lock();
        if *last_saved >= self.generation {
            tracing::debug!(generation = self.generation, "skipping superseded catalog snapshot");
            return;
        }
        match self.store.save_catalog(&self.catalog) {
            Ok(()) => *last_saved = self.generation,
            Err(err) => tracing::error!(error = %err, "failed to persist catalog"),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<RwLock<Catalog>>,
    store: Option<SharedStore>,
    saves: Arc<SaveTracker>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_shared(Arc::new(RwLock::new(catalog)))
    }

    pub fn with_shared(catalog: Arc<RwLock<Catalog>>) -> Self {
        Self {
            catalog,
            store: None,
            saves: Arc::new(SaveTracker::default()),
        }
    }

    /// Write the catalog through `store` after every successful mutation.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    fn catalog(&self) -> Arc<RwLock<Catalog>> {
        self.catalog.clone()
    }

    /// Copy the catalog for saving. Call while still holding the write lock
    /// so snapshots are numbered in mutation order.
    fn snapshot(&self, catalog: &Catalog) -> Option<PendingSave> {
        let store = self.store.clone()?;
        let generation = self.saves.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Some(PendingSave {
            store,
            tracker: self.saves.clone(),
            generation,
            catalog: catalog.clone(),
        })
    }

    /// Write a snapshot on the blocking pool. Must be awaited after the
    /// catalog guard has been released.
    async fn persist(&self, pending: Option<PendingSave>) {
        let Some(pending) = pending else {
            return;
        };
        if let Err(err) = tokio::task::spawn_blocking(move || pending.write()).await {
            tracing::error!(error = %err, "catalog save task failed");
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            e if e.is_not_found() => ApiError::NotFound(message),
            CatalogError::DuplicateCourse(_)
            | CatalogError::DuplicateStudent(_)
            | CatalogError::DuplicateUsername(_)
            | CatalogError::DuplicateProfessor(_)
            | CatalogError::ProfessorBusy { .. }
            | CatalogError::ProfessorAssigned { .. } => ApiError::Conflict(message),
            CatalogError::Roster(roster) => roster.into(),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        let message = err.to_string();
        match err {
            RosterError::CourseFull { .. }
            | RosterError::AlreadyEnrolled { .. }
            | RosterError::ScheduleConflict { .. } => ApiError::Conflict(message),
            RosterError::InvalidArgument(_) | RosterError::NotEnrolled { .. } => {
                ApiError::Invalid(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Course as exposed over HTTP: the meeting pattern in text form plus seat
/// counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseView {
    pub id: String,
    pub name: String,
    pub professor_id: String,
    pub days: String,
    pub start: String,
    pub end: String,
    pub capacity: u32,
    pub enrolled: Vec<String>,
    pub seats_left: u32,
}

impl From<&CourseRoster> for CourseView {
    fn from(course: &CourseRoster) -> Self {
        Self {
            id: course.id().to_string(),
            name: course.name().to_string(),
            professor_id: course.professor_id().to_string(),
            days: course.pattern().day_codes(),
            start: course.pattern().start_text(),
            end: course.pattern().end_text(),
            capacity: course.capacity(),
            enrolled: course.enrolled().map(str::to_string).collect(),
            seats_left: course.seats_left(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub course_id: String,
    pub name: String,
    pub days: String,
    pub start: String,
    pub end: String,
    pub grade: String,
}

#[derive(Debug, Deserialize)]
struct CreateCoursePayload {
    id: String,
    name: String,
    professor_id: String,
    days: String,
    start: String,
    end: String,
    capacity: i32,
}

#[derive(Debug, Deserialize)]
struct CapacityPayload {
    capacity: i32,
}

#[derive(Debug, Deserialize)]
struct PatternPayload {
    days: String,
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct EnrollPayload {
    student_id: String,
}

/// Directory entry as exposed over HTTP; credentials stay server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: String,
    pub name: String,
    pub username: String,
}

impl From<&Student> for ProfileView {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            username: student.username.clone(),
        }
    }
}

impl From<&Professor> for ProfileView {
    fn from(professor: &Professor) -> Self {
        Self {
            id: professor.id.clone(),
            name: professor.name.clone(),
            username: professor.username.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/:id", get(get_course).delete(delete_course))
        .route("/courses/:id/capacity", put(set_capacity))
        .route("/courses/:id/pattern", put(set_pattern))
        .route("/courses/:id/enrollments", post(enroll_student))
        .route(
            "/courses/:id/enrollments/:student_id",
            delete(drop_student),
        )
        .route("/students/:id", put(update_student))
        .route("/students/:id/schedule", get(student_schedule))
        .route("/professors/:id", put(update_professor))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_courses(State(state): State<AppState>) -> Json<Vec<CourseView>> {
    let catalog = state.catalog();
    let courses = {
        let guard = catalog.read();
        guard.courses().map(CourseView::from).collect()
    };
    Json(courses)
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseView>, ApiError> {
    let catalog = state.catalog();
    let guard = catalog.read();
    let course = guard.course(&course_id)?;
    Ok(Json(CourseView::from(course)))
}

async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CreateCoursePayload>,
) -> Result<(StatusCode, Json<CourseView>), ApiError> {
    let course = CourseRoster::parse(
        payload.id,
        payload.name,
        payload.professor_id,
        &payload.days,
        &payload.start,
        &payload.end,
        payload.capacity,
    )?;
    let catalog = state.catalog();
    let (created, pending) = {
        let mut guard = catalog.write();
        let course_id = course.id().to_string();
        guard.add_course(course)?;
        let created = CourseView::from(guard.course(&course_id)?);
        (created, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = state.catalog();
    let (affected, pending) = {
        let mut guard = catalog.write();
        let affected = guard.delete_course(&course_id)?;
        (affected, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok(Json(json!({
        "course_id": course_id,
        "affected_students": affected,
    })))
}

async fn set_capacity(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<CapacityPayload>,
) -> Result<Json<CourseView>, ApiError> {
    let catalog = state.catalog();
    let (view, pending) = {
        let mut guard = catalog.write();
        guard.set_course_capacity(&course_id, payload.capacity)?;
        let view = CourseView::from(guard.course(&course_id)?);
        (view, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok(Json(view))
}

async fn set_pattern(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<PatternPayload>,
) -> Result<Json<CourseView>, ApiError> {
    let pattern = MeetingPattern::parse(&payload.days, &payload.start, &payload.end)
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    let catalog = state.catalog();
    let (view, pending) = {
        let mut guard = catalog.write();
        guard.set_course_pattern(&course_id, pattern)?;
        let view = CourseView::from(guard.course(&course_id)?);
        (view, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok(Json(view))
}

async fn enroll_student(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<EnrollPayload>,
) -> Result<(StatusCode, Json<EnrollmentOutcome>), ApiError> {
    let catalog = state.catalog();
    let (outcome, pending) = {
        let mut guard = catalog.write();
        let outcome = guard.enroll(payload.student_id.trim(), &course_id)?;
        (outcome, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn drop_student(
    State(state): State<AppState>,
    Path((course_id, student_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let catalog = state.catalog();
    let pending = {
        let mut guard = catalog.write();
        guard.drop_enrollment(&student_id, &course_id)?;
        state.snapshot(&guard)
    };
    state.persist(pending).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ApiError> {
    let catalog = state.catalog();
    let (view, pending) = {
        let mut guard = catalog.write();
        let view = ProfileView::from(guard.update_student(&student_id, &update)?);
        (view, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok(Json(view))
}

async fn update_professor(
    State(state): State<AppState>,
    Path(professor_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ApiError> {
    let catalog = state.catalog();
    let (view, pending) = {
        let mut guard = catalog.write();
        let view = ProfileView::from(guard.update_professor(&professor_id, &update)?);
        (view, state.snapshot(&guard))
    };
    state.persist(pending).await;
    Ok(Json(view))
}

async fn student_schedule(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<ScheduleEntry>>, ApiError> {
    let catalog = state.catalog();
    let guard = catalog.read();
    let entries = guard
        .schedule_of(&student_id)?
        .into_iter()
        .map(|(course, grade)| ScheduleEntry {
            course_id: course.id().to_string(),
            name: course.name().to_string(),
            days: course.pattern().day_codes(),
            start: course.pattern().start_text(),
            end: course.pattern().end_text(),
            grade: grade.to_string(),
        })
        .collect();
    Ok(Json(entries))
}
