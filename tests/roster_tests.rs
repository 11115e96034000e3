use course_roster::{CourseRoster, MeetingPattern, RosterError};

fn roster(capacity: i32) -> CourseRoster {
    CourseRoster::parse("CIS101", "Intro to Programming", "P1", "MWF", "09:00", "10:00", capacity)
        .expect("valid roster")
}

#[test]
fn new_roster_is_empty() {
    let course = roster(30);
    assert_eq!(course.capacity(), 30);
    assert_eq!(course.enrolled_count(), 0);
    assert_eq!(course.seats_left(), 30);
    assert!(course.has_room());
    assert!(!course.is_full());
}

#[test]
fn negative_capacity_is_rejected() {
    let err = CourseRoster::parse("C1", "Course", "P1", "M", "09:00", "10:00", -1).unwrap_err();
    assert!(matches!(err, RosterError::InvalidArgument(_)));
}

#[test]
fn empty_course_id_is_rejected() {
    let pattern = MeetingPattern::parse("M", "09:00", "10:00").unwrap();
    let err = CourseRoster::new("  ", "Course", "P1", pattern, 10).unwrap_err();
    assert!(matches!(err, RosterError::InvalidArgument(_)));
}

#[test]
fn malformed_pattern_surfaces_as_invalid_argument() {
    let err = CourseRoster::parse("C1", "Course", "P1", "Q", "09:00", "10:00", 5).unwrap_err();
    assert!(matches!(err, RosterError::InvalidArgument(_)));
}

#[test]
fn zero_capacity_course_admits_nobody() {
    let mut course = roster(0);
    assert!(course.is_full());
    let err = course.enroll("S1").unwrap_err();
    assert_eq!(
        err,
        RosterError::CourseFull {
            course_id: "CIS101".into(),
            capacity: 0,
            enrolled: 0,
        }
    );
    assert_eq!(course.enrolled_count(), 0);
}

#[test]
fn enroll_fills_to_capacity_then_rejects() {
    let mut course = roster(2);
    course.enroll("S1").unwrap();
    course.enroll("S2").unwrap();
    assert!(course.is_full());
    assert_eq!(course.seats_left(), 0);

    let err = course.enroll("S3").unwrap_err();
    assert!(matches!(err, RosterError::CourseFull { capacity: 2, enrolled: 2, .. }));
    assert!(!course.is_enrolled("S3"));
}

#[test]
fn duplicate_enrollment_is_rejected_before_capacity() {
    let mut course = roster(1);
    course.enroll("S1").unwrap();
    let err = course.enroll("S1").unwrap_err();
    assert!(matches!(err, RosterError::AlreadyEnrolled { .. }));
    assert_eq!(course.enrolled_count(), 1);
}

#[test]
fn empty_student_id_is_rejected() {
    let mut course = roster(5);
    assert!(matches!(
        course.enroll(" "),
        Err(RosterError::InvalidArgument(_))
    ));
}

#[test]
fn student_ids_are_matched_exactly() {
    let mut course = roster(5);
    assert!(matches!(
        course.enroll("S1 "),
        Err(RosterError::InvalidArgument(_))
    ));
    course.enroll("S1").unwrap();
    assert!(matches!(
        course.drop_student(" S1"),
        Err(RosterError::NotEnrolled { .. })
    ));
    assert!(course.is_enrolled("S1"));
}

#[test]
fn course_fields_reject_file_separators() {
    let pattern = MeetingPattern::parse("M", "09:00", "10:00").unwrap();
    assert!(CourseRoster::new("C1", "Intro; Lab", "P1", pattern.clone(), 10).is_err());
    assert!(CourseRoster::new("C 1", "Intro", "P1", pattern.clone(), 10).is_err());
    let course = CourseRoster::new("C1", "  Intro, Lab ", "P1", pattern, 10).unwrap();
    assert_eq!(course.name(), "Intro, Lab");
}

#[test]
fn drop_frees_a_seat_and_second_drop_fails() {
    let mut course = roster(1);
    course.enroll("S1").unwrap();
    course.drop_student("S1").unwrap();
    assert_eq!(course.enrolled_count(), 0);
    assert!(course.has_room());

    let err = course.drop_student("S1").unwrap_err();
    assert!(matches!(err, RosterError::NotEnrolled { .. }));
    assert_eq!(course.enrolled_count(), 0);

    course.enroll("S2").unwrap();
    assert!(course.is_enrolled("S2"));
}

#[test]
fn lowering_capacity_below_headcount_keeps_students_and_blocks_new_ones() {
    let mut course = roster(3);
    for id in ["S1", "S2", "S3"] {
        course.enroll(id).unwrap();
    }
    course.set_capacity(1).unwrap();
    assert_eq!(course.capacity(), 1);
    assert_eq!(course.enrolled_count(), 3);
    assert!(course.is_over_capacity());
    assert_eq!(course.seats_left(), 0);
    assert!(course.enroll("S4").is_err());

    course.drop_student("S1").unwrap();
    course.drop_student("S2").unwrap();
    assert!(!course.is_over_capacity());
    assert!(course.enroll("S4").is_err());
    course.drop_student("S3").unwrap();
    course.enroll("S4").unwrap();
}

#[test]
fn set_capacity_rejects_negative_values_and_keeps_old_limit() {
    let mut course = roster(10);
    assert!(course.set_capacity(-5).is_err());
    assert_eq!(course.capacity(), 10);
}

#[test]
fn rename_requires_a_name() {
    let mut course = roster(10);
    assert!(course.rename("   ").is_err());
    course.rename("Programming I").unwrap();
    assert_eq!(course.name(), "Programming I");
}

#[test]
fn conflicts_with_uses_meeting_pattern() {
    let course = roster(10);
    let overlapping = MeetingPattern::parse("F", "09:59", "11:00").unwrap();
    let adjacent = MeetingPattern::parse("F", "10:00", "11:00").unwrap();
    assert!(course.conflicts_with(&overlapping));
    assert!(!course.conflicts_with(&adjacent));
}
