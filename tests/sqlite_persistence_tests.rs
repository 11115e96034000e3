#![cfg(feature = "sqlite")]

use course_roster::{
    Admin, Catalog, CatalogStore, CourseRoster, Professor, SqliteCatalogStore, Student,
};
use tempfile::NamedTempFile;

fn build_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .add_professor(Professor::new("P1", "Grace Hopper", "grace", "pw"))
        .unwrap();
    catalog
        .add_course(CourseRoster::parse("C1", "Compilers", "P1", "MWF", "08:00", "08:50", 2).unwrap())
        .unwrap();
    catalog
        .add_course(CourseRoster::parse("C2", "Systems", "P1", "TR", "10:00", "11:15", 1).unwrap())
        .unwrap();
    for (id, name) in [("S1", "Sam"), ("S2", "Tess")] {
        catalog
            .add_student(Student::new(id, name, name.to_lowercase(), "pw"))
            .unwrap();
    }
    catalog.add_admin(Admin::new("A1", "Root", "root", "pw")).unwrap();
    catalog.enroll("S1", "C1").unwrap();
    catalog.enroll("S2", "C1").unwrap();
    catalog.enroll("S1", "C2").unwrap();
    catalog.set_grade("S1", "C2", "A").unwrap();
    catalog
}

#[test]
fn sqlite_store_round_trip_catalog() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteCatalogStore::new(file.path()).unwrap();
    let catalog = build_catalog();

    store.save_catalog(&catalog).expect("save catalog");
    let loaded = store
        .load_catalog()
        .expect("load catalog")
        .expect("catalog exists");

    assert_eq!(
        loaded.courses().cloned().collect::<Vec<_>>(),
        catalog.courses().cloned().collect::<Vec<_>>()
    );
    assert_eq!(
        loaded.students().cloned().collect::<Vec<_>>(),
        catalog.students().cloned().collect::<Vec<_>>()
    );
    assert_eq!(loaded.admins(), catalog.admins());
    assert!(loaded.course("C1").unwrap().is_full());
    assert_eq!(loaded.student("S1").unwrap().courses().grade("C2"), Some("A"));
}

#[test]
fn empty_database_has_no_catalog() {
    let store = SqliteCatalogStore::in_memory().unwrap();
    assert!(store.load_catalog().unwrap().is_none());
}

#[test]
fn saving_replaces_previous_rows() {
    let store = SqliteCatalogStore::in_memory().unwrap();
    let mut catalog = build_catalog();
    store.save_catalog(&catalog).unwrap();

    catalog.delete_course("C2").unwrap();
    catalog.drop_enrollment("S2", "C1").unwrap();
    store.save_catalog(&catalog).unwrap();

    let loaded = store.load_catalog().unwrap().unwrap();
    assert!(loaded.course("C2").is_err());
    assert_eq!(loaded.course("C1").unwrap().enrolled_count(), 1);
    assert!(loaded.student("S1").unwrap().courses().grade("C2").is_none());
    loaded.verify_consistency().unwrap();
}
