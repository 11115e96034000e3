#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use course_roster::http_api::{self, CourseView, ProfileView, ScheduleEntry};
use course_roster::{
    Catalog, CatalogStore, CourseRoster, EnrollmentOutcome, FlatFileStore, PersistenceError,
    Professor, Student,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

fn seeded_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .add_professor(Professor::new("P1", "Ada Lovelace", "ada", "pw"))
        .unwrap();
    catalog
        .add_professor(Professor::new("P2", "Alan Turing", "alan", "pw"))
        .unwrap();
    catalog
        .add_course(CourseRoster::parse("C1", "Logic", "P1", "MW", "09:00", "10:00", 1).unwrap())
        .unwrap();
    catalog
        .add_course(CourseRoster::parse("C2", "Algebra", "P2", "M", "09:30", "10:30", 10).unwrap())
        .unwrap();
    for (id, name) in [("S", "Sam"), ("T", "Tess")] {
        catalog
            .add_student(Student::new(id, name, name.to_lowercase(), "pw"))
            .unwrap();
    }
    catalog
}

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(seeded_catalog());
    http_api::router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn enrollment_lifecycle_via_http_api() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C1/enrollments", json!({ "student_id": "S" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let outcome: EnrollmentOutcome = read_json(response).await;
    assert_eq!(outcome.seats_left, 0);

    // Conflicting course
    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C2/enrollments", json!({ "student_id": "S" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "conflict");
    assert!(body["message"].as_str().unwrap().contains("C1"));

    // Full course
    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C1/enrollments", json!({ "student_id": "T" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/students/S/schedule"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let schedule: Vec<ScheduleEntry> = read_json(response).await;
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0].course_id, "C1");
    assert_eq!(schedule[0].grade, "Not Graded");

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/courses/C1/enrollments/S"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Dropping again is a bad request
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/courses/C1/enrollments/S"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(empty_request("GET", "/courses/C1"))
        .await
        .unwrap();
    let course: CourseView = read_json(response).await;
    assert!(course.enrolled.is_empty());
    assert_eq!(course.seats_left, 1);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/courses/NOPE"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C1/enrollments", json!({ "student_id": "ghost" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("GET", "/students/ghost/schedule"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn course_admin_via_http_api() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/courses",
            json!({
                "id": "C3", "name": "Automata", "professor_id": "P1",
                "days": "TR", "start": "13:00", "end": "14:15", "capacity": 20
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: CourseView = read_json(response).await;
    assert_eq!(created.days, "TR");
    assert_eq!(created.seats_left, 20);

    // Same professor, overlapping time
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/courses",
            json!({
                "id": "C4", "name": "Clash", "professor_id": "P1",
                "days": "R", "start": "14:00", "end": "15:00", "capacity": 5
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/courses",
            json!({
                "id": "C5", "name": "Bad", "professor_id": "P1",
                "days": "M", "start": "08:00", "end": "09:00", "capacity": -2
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/courses/C3/capacity", json!({ "capacity": 2 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: CourseView = read_json(response).await;
    assert_eq!(updated.capacity, 2);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/courses/C3/pattern",
            json!({ "days": "F", "start": "10:00", "end": "11:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let moved: CourseView = read_json(response).await;
    assert_eq!((moved.days.as_str(), moved.start.as_str()), ("F", "10:00"));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/courses/C3/pattern",
            json!({ "days": "F", "start": "11:00", "end": "10:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C3/enrollments", json!({ "student_id": "T" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/courses/C3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["affected_students"], json!(["T"]));

    let response = app
        .oneshot(empty_request("GET", "/courses"))
        .await
        .unwrap();
    let courses: Vec<CourseView> = read_json(response).await;
    let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C1", "C2"]);
}

/// Records, for every save, whether the shared catalog could be read while
/// the save was running and how many seats C1 had in the saved copy.
struct RecordingStore {
    shared: Arc<RwLock<Catalog>>,
    saves: Mutex<Vec<(bool, usize)>>,
}

impl CatalogStore for RecordingStore {
    fn save_catalog(&self, catalog: &Catalog) -> Result<(), PersistenceError> {
        let readable = self.shared.try_read().is_some();
        let seats = catalog.course("C1").map(|c| c.enrolled_count()).unwrap_or_default();
        self.saves.lock().push((readable, seats));
        Ok(())
    }

    fn load_catalog(&self) -> Result<Option<Catalog>, PersistenceError> {
        Ok(None)
    }
}

#[tokio::test]
async fn saves_run_after_the_catalog_lock_is_released() {
    let shared = Arc::new(RwLock::new(seeded_catalog()));
    let store = Arc::new(RecordingStore {
        shared: shared.clone(),
        saves: Mutex::new(Vec::new()),
    });
    let app = http_api::router(http_api::AppState::with_shared(shared.clone()).with_store(store.clone()));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C1/enrollments", json!({ "student_id": "S" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Rejected mutations are not saved.
    let response = app
        .oneshot(json_request("POST", "/courses/C1/enrollments", json!({ "student_id": "T" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(*store.saves.lock(), vec![(true, 1)]);
}

#[tokio::test]
async fn enrollments_reach_the_data_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FlatFileStore::new(dir.path());
    let app = http_api::router(
        http_api::AppState::new(seeded_catalog()).with_store(Arc::new(store.clone())),
    );

    let response = app
        .clone()
        .oneshot(json_request("POST", "/courses/C2/enrollments", json!({ "student_id": "T" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let students = std::fs::read_to_string(dir.path().join("studentinfo.txt")).unwrap();
    assert!(students.contains("T;Tess;tess;pw;C2: Not Graded"), "{students}");

    let response = app
        .oneshot(empty_request("DELETE", "/courses/C2/enrollments/T"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let reloaded = store.load_catalog().unwrap().unwrap();
    assert!(reloaded.student("T").unwrap().courses().is_empty());
}

#[tokio::test]
async fn profile_updates_via_http_api() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/students/S", json!({ "name": "Samuel", "password": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile: ProfileView = read_json(response).await;
    assert_eq!((profile.name.as_str(), profile.username.as_str()), ("Samuel", "sam"));

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/students/S", json!({ "username": "tess" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/professors/P2", json!({ "name": "Alan; Turing" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request("PUT", "/professors/P9", json!({ "name": "Nobody" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
