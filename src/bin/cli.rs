use clap::Parser;
use course_roster::config::AppConfig;
use course_roster::report::{
    course_frame, open_course_frame, render_frame_as_text_table, schedule_frame,
};
use course_roster::{
    Catalog, CatalogError, CatalogStore, CourseRoster, FlatFileStore, MeetingPattern, Professor,
    ProfileUpdate, Student, load_catalog_from_json, logging, save_catalog_to_json,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cli", about = "Interactive course enrollment console")]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding courseinfo.txt, studentinfo.txt, profinfo.txt and admininfo.txt.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  courses                                List every course\n  open                                   List courses with seats left\n  course <id>                            Show one course\n  students <course>                      List students enrolled in a course\n  schedule <student>                     Show a student's courses and grades\n  check <student> <course>               Preview schedule conflicts for an enrollment\n  enroll <student> <course>              Enroll a student\n  drop <student> <course>                Drop a student from a course\n  grade <student> <course> <grade...>    Record a grade\n  capacity <course> <n>                  Change a course's capacity\n  pattern <course> <days> <start> <end>  Move a course to a new meeting time\n  add-course <id> <prof_id> <days> <start> <end> <cap> <name...>\n                                         Create a course\n  delete-course <id>                     Delete a course and its enrollments\n  rename-course <id> <name...>           Rename a course\n  assign <course> <prof_id>              Hand a course to another professor\n  list-students                          List every student\n  add-student <id> <user> <pass> <name...>\n                                         Register a student\n  edit-student <id> <name|username|password> <value...>\n                                         Change one student field\n  remove-student <id>                    Delete a student and free their seats\n  list-professors                        List every professor\n  add-professor <id> <user> <pass> <name...>\n                                         Register a professor\n  edit-professor <id> <name|username|password> <value...>\n                                         Change one professor field\n  remove-professor <id>                  Delete a professor with no courses\n  save                                   Write the catalog to the data files\n  save-json <path>                       Write a JSON snapshot\n  load-json <path>                       Replace the catalog from a JSON snapshot\n  quit|exit                              Exit"
    );
}

/// A one-field profile edit, or `None` for an unknown field name.
fn field_update(field: &str, value: String) -> Option<ProfileUpdate> {
    let mut update = ProfileUpdate::default();
    match field {
        "name" => update.name = Some(value),
        "username" => update.username = Some(value),
        "password" => update.password = Some(value),
        _ => return None,
    }
    Some(update)
}

struct Session {
    catalog: Catalog,
    store: FlatFileStore,
}

impl Session {
    fn persist(&self) {
        if let Err(e) = self.store.save_catalog(&self.catalog) {
            println!("Warning: changes kept in memory but not saved: {e}");
        }
    }

    fn show_table(&self, frame: polars::prelude::PolarsResult<polars::prelude::DataFrame>) {
        match frame {
            Ok(df) => println!("{}", render_frame_as_text_table(&df)),
            Err(e) => println!("Error: {e}"),
        }
    }

    fn show_course(&self, course: &CourseRoster) {
        println!(
            "{} {} (professor {}) {} capacity {} enrolled {} seats left {}",
            course.id(),
            course.name(),
            course.professor_id(),
            course.pattern(),
            course.capacity(),
            course.enrolled_count(),
            course.seats_left()
        );
    }

    fn report(&self, result: Result<String, CatalogError>) {
        match result {
            Ok(message) => {
                println!("{message}");
                self.persist();
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    /// Run one command line. Returns false when the session should end.
    fn execute(&mut self, input: &str) -> bool {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&cmd, args)) = parts.split_first() else {
            return true;
        };

        match (cmd, args) {
            ("quit" | "exit", _) => return false,
            ("help", _) => print_help(),
            ("courses", _) => self.show_table(course_frame(&self.catalog)),
            ("open", _) => self.show_table(open_course_frame(&self.catalog)),
            ("course", [id]) => match self.catalog.course(id) {
                Ok(course) => self.show_course(course),
                Err(e) => println!("Error: {e}"),
            },
            ("students", [course_id]) => match self.catalog.roster_of(course_id) {
                Ok(students) if students.is_empty() => println!("No students enrolled."),
                Ok(students) => {
                    for student in students {
                        println!("  {:<12} {}", student.id, student.name);
                    }
                }
                Err(e) => println!("Error: {e}"),
            },
            ("schedule", [student_id]) => {
                if let Err(e) = self.catalog.student(student_id) {
                    println!("Error: {e}");
                } else {
                    self.show_table(schedule_frame(&self.catalog, student_id));
                }
            }
            ("check", [student_id, course_id]) => {
                match self.catalog.conflicts_for(student_id, course_id) {
                    Ok(conflicts) if conflicts.is_empty() => println!("No conflicts."),
                    Ok(conflicts) => println!("Conflicts with: {}", conflicts.join(", ")),
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("enroll", [student_id, course_id]) => {
                match self.catalog.enroll(student_id, course_id) {
                    Ok(outcome) => {
                        println!(
                            "Enrolled {} in {} ({} seats left).",
                            outcome.student_id, outcome.course_id, outcome.seats_left
                        );
                        self.persist();
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("drop", [student_id, course_id]) => {
                match self.catalog.drop_enrollment(student_id, course_id) {
                    Ok(()) => {
                        println!("Dropped {student_id} from {course_id}.");
                        self.persist();
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("grade", [student_id, course_id, grade @ ..]) if !grade.is_empty() => {
                let grade = grade.join(" ");
                match self.catalog.set_grade(student_id, course_id, &grade) {
                    Ok(()) => {
                        println!("Recorded {grade} for {student_id} in {course_id}.");
                        self.persist();
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("capacity", [course_id, capacity]) => {
                let Ok(capacity) = capacity.parse::<i32>() else {
                    println!("Invalid capacity");
                    return true;
                };
                match self.catalog.set_course_capacity(course_id, capacity) {
                    Ok(()) => {
                        println!("Capacity of {course_id} set to {capacity}.");
                        self.persist();
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("pattern", [course_id, days, start, end]) => {
                let pattern = match MeetingPattern::parse(days, start, end) {
                    Ok(p) => p,
                    Err(e) => {
                        println!("Error: {e}");
                        return true;
                    }
                };
                let text = pattern.to_string();
                match self.catalog.set_course_pattern(course_id, pattern) {
                    Ok(()) => {
                        println!("{course_id} now meets {text}.");
                        self.persist();
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("add-course", [id, professor_id, days, start, end, capacity, name @ ..])
                if !name.is_empty() =>
            {
                let Ok(capacity) = capacity.parse::<i32>() else {
                    println!("Invalid capacity");
                    return true;
                };
                let added = CourseRoster::parse(
                    *id,
                    name.join(" "),
                    *professor_id,
                    days,
                    start,
                    end,
                    capacity,
                )
                .map_err(CatalogError::from)
                .and_then(|course| self.catalog.add_course(course));
                match added {
                    Ok(()) => {
                        println!("Added course {id}.");
                        self.persist();
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            ("delete-course", [course_id]) => match self.catalog.delete_course(course_id) {
                Ok(affected) => {
                    println!(
                        "Deleted {course_id} ({} students affected).",
                        affected.len()
                    );
                    self.persist();
                }
                Err(e) => println!("Error: {e}"),
            },
            ("rename-course", [course_id, name @ ..]) if !name.is_empty() => {
                let name = name.join(" ");
                let result = self
                    .catalog
                    .rename_course(course_id, &name)
                    .map(|()| format!("{course_id} renamed to {name}."));
                self.report(result);
            }
            ("assign", [course_id, professor_id]) => {
                let result = self
                    .catalog
                    .assign_professor(course_id, professor_id)
                    .map(|()| format!("{course_id} is now taught by {professor_id}."));
                self.report(result);
            }
            ("list-students", []) => {
                for student in self.catalog.students() {
                    println!(
                        "  {:<12} {:<24} {:<12} {} courses",
                        student.id,
                        student.name,
                        student.username,
                        student.courses().len()
                    );
                }
            }
            ("add-student", [id, username, password, name @ ..]) if !name.is_empty() => {
                let student = Student::new(*id, name.join(" "), *username, *password);
                let result = self
                    .catalog
                    .add_student(student)
                    .map(|()| format!("Added student {id}."));
                self.report(result);
            }
            ("edit-student", [id, field, value @ ..]) if !value.is_empty() => {
                let Some(update) = field_update(field, value.join(" ")) else {
                    println!("Unknown field '{field}'; use name, username or password.");
                    return true;
                };
                let result = self
                    .catalog
                    .update_student(id, &update)
                    .map(|s| format!("Updated student {} ({}, {}).", s.id, s.name, s.username));
                self.report(result);
            }
            ("remove-student", [id]) => {
                let result = self
                    .catalog
                    .remove_student(id)
                    .map(|s| format!("Removed student {} ({} courses released).", s.id, s.courses().len()));
                self.report(result);
            }
            ("list-professors", []) => {
                for professor in self.catalog.professors() {
                    let taught: Vec<&str> = self
                        .catalog
                        .courses_taught_by(&professor.id)
                        .into_iter()
                        .map(CourseRoster::id)
                        .collect();
                    println!(
                        "  {:<12} {:<24} {:<12} {}",
                        professor.id,
                        professor.name,
                        professor.username,
                        taught.join(", ")
                    );
                }
            }
            ("add-professor", [id, username, password, name @ ..]) if !name.is_empty() => {
                let professor = Professor::new(*id, name.join(" "), *username, *password);
                let result = self
                    .catalog
                    .add_professor(professor)
                    .map(|()| format!("Added professor {id}."));
                self.report(result);
            }
            ("edit-professor", [id, field, value @ ..]) if !value.is_empty() => {
                let Some(update) = field_update(field, value.join(" ")) else {
                    println!("Unknown field '{field}'; use name, username or password.");
                    return true;
                };
                let result = self
                    .catalog
                    .update_professor(id, &update)
                    .map(|p| format!("Updated professor {} ({}, {}).", p.id, p.name, p.username));
                self.report(result);
            }
            ("remove-professor", [id]) => {
                let result = self
                    .catalog
                    .remove_professor(id)
                    .map(|p| format!("Removed professor {} ({}).", p.id, p.name));
                self.report(result);
            }
            ("save", []) => match self.store.save_catalog(&self.catalog) {
                Ok(()) => println!("Saved."),
                Err(e) => println!("Save error: {e}"),
            },
            ("save-json", [path]) => match save_catalog_to_json(&self.catalog, path) {
                Ok(()) => println!("Saved JSON snapshot to {path}."),
                Err(e) => println!("Save error: {e}"),
            },
            ("load-json", [path]) => match load_catalog_from_json(path) {
                Ok(catalog) => {
                    self.catalog = catalog;
                    println!("Loaded JSON snapshot from {path}.");
                    self.persist();
                }
                Err(e) => println!("Load error: {e}"),
            },
            ("course" | "students" | "schedule" | "check" | "enroll" | "drop" | "grade"
            | "capacity" | "pattern" | "add-course" | "delete-course" | "rename-course"
            | "assign" | "list-students" | "add-student" | "edit-student" | "remove-student"
            | "list-professors" | "add-professor" | "edit-professor" | "remove-professor"
            | "save" | "save-json" | "load-json", _) => {
                println!("Wrong arguments for '{cmd}'. Type 'help' for usage.");
            }
            _ => println!("Unknown command '{cmd}'. Type 'help' for commands."),
        }
        true
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .apply_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    logging::init_logger(&config.log_filter, args.verbose);

    let store = FlatFileStore::from_config(&config);
    let catalog = match store.load_catalog()? {
        Some(catalog) => catalog,
        None => {
            println!(
                "No course file at {}; starting with an empty catalog.",
                store.course_path().display()
            );
            Catalog::new()
        }
    };

    println!("Course Roster (CLI) - type 'help' for commands\n");
    let mut session = Session { catalog, store };

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if !session.execute(line.trim()) {
            break;
        }
    }
    Ok(())
}
