use crate::catalog::Catalog;
use polars::prelude::*;

/// One row per course with its meeting time and seat counts.
pub fn course_frame(catalog: &Catalog) -> PolarsResult<DataFrame> {
    let courses: Vec<_> = catalog.courses().collect();

    let ids: Vec<&str> = courses.iter().map(|c| c.id()).collect();
    let names: Vec<&str> = courses.iter().map(|c| c.name()).collect();
    let professors: Vec<&str> = courses.iter().map(|c| c.professor_id()).collect();
    let days: Vec<String> = courses.iter().map(|c| c.pattern().day_codes()).collect();
    let starts: Vec<String> = courses.iter().map(|c| c.pattern().start_text()).collect();
    let ends: Vec<String> = courses.iter().map(|c| c.pattern().end_text()).collect();
    let capacity: Vec<u32> = courses.iter().map(|c| c.capacity()).collect();
    let enrolled: Vec<u32> = courses
        .iter()
        .map(|c| u32::try_from(c.enrolled_count()).unwrap_or(u32::MAX))
        .collect();
    let seats_left: Vec<u32> = courses.iter().map(|c| c.seats_left()).collect();

    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static("course_id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("professor_id"), professors).into_column(),
        Series::new(PlSmallStr::from_static("days"), days).into_column(),
        Series::new(PlSmallStr::from_static("start"), starts).into_column(),
        Series::new(PlSmallStr::from_static("end"), ends).into_column(),
        Series::new(PlSmallStr::from_static("capacity"), capacity).into_column(),
        Series::new(PlSmallStr::from_static("enrolled"), enrolled).into_column(),
        Series::new(PlSmallStr::from_static("seats_left"), seats_left).into_column(),
    ];
    DataFrame::new(columns)
}

/// Courses that can still admit a student.
pub fn open_course_frame(catalog: &Catalog) -> PolarsResult<DataFrame> {
    course_frame(catalog)?
        .lazy()
        .filter(col("seats_left").gt(lit(0u32)))
        .collect()
}

/// A student's timetable, one row per enrolled course.
pub fn schedule_frame(catalog: &Catalog, student_id: &str) -> PolarsResult<DataFrame> {
    let schedule = catalog
        .schedule_of(student_id)
        .map_err(|err| PolarsError::ComputeError(err.to_string().into()))?;

    let ids: Vec<&str> = schedule.iter().map(|(c, _)| c.id()).collect();
    let names: Vec<&str> = schedule.iter().map(|(c, _)| c.name()).collect();
    let days: Vec<String> = schedule.iter().map(|(c, _)| c.pattern().day_codes()).collect();
    let starts: Vec<String> = schedule.iter().map(|(c, _)| c.pattern().start_text()).collect();
    let ends: Vec<String> = schedule.iter().map(|(c, _)| c.pattern().end_text()).collect();
    let grades: Vec<&str> = schedule.iter().map(|(_, grade)| *grade).collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("course_id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("days"), days).into_column(),
        Series::new(PlSmallStr::from_static("start"), starts).into_column(),
        Series::new(PlSmallStr::from_static("end"), ends).into_column(),
        Series::new(PlSmallStr::from_static("grade"), grades).into_column(),
    ])
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Draw a frame as a boxed ASCII table.
pub fn render_frame_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names, &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_row(out: &mut String, values: &[String], widths: &[usize]) {
    out.push('|');
    for (value, width) in values.iter().zip(widths) {
        out.push(' ');
        out.push_str(value);
        out.push_str(&" ".repeat(width.saturating_sub(value.len())));
        out.push_str(" |");
    }
    out.push('\n');
}
