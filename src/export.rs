//! CSV assembly for the completion archive.

use crate::store::TaskRecord;

const CSV_HEADER: &str = "id,name,description,priority,tags,project,due_date,created_at,completed_at";

/// Render completed tasks as CSV, header first.
pub fn archive_csv(tasks: &[TaskRecord]) -> String {
    let mut lines = Vec::with_capacity(tasks.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for task in tasks {
        let fields = [
            task.id.clone(),
            task.name.clone(),
            task.description.clone().unwrap_or_default(),
            task.priority.clone(),
            task.tags.clone().unwrap_or_default(),
            task.project.clone().unwrap_or_default(),
            task.due_date.map(|date| date.to_string()).unwrap_or_default(),
            task.created_at.to_rfc3339(),
            task.completed_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|field| escape_field(field)).collect();
        lines.push(row.join(","));
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
