use super::crud::{self, EntitySchema};
use crate::ipc::error::ApiError;
use crate::ipc::helpers::require_db;
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::{json, Value};

pub const CLASSES: EntitySchema = EntitySchema {
    collection: "classes",
    code_field: None,
    code_prefix: "",
    required: &["name", "section"],
    statuses: &[],
    default_status: None,
    filters: &["section", "inchargeTeacherId"],
    search: &["name"],
};

/// Enrollment is computed from student placements, never stored.
fn enrollment_of(students: &[Value], class: &Value) -> usize {
    let name = class.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let section = class.get("section").and_then(|v| v.as_str()).unwrap_or("");
    students
        .iter()
        .filter(|s| {
            s.get("status").and_then(|v| v.as_str()) == Some("Active")
                && s.get("class").and_then(|v| v.as_str()) == Some(name)
                && s.get("section").and_then(|v| v.as_str()) == Some(section)
        })
        .count()
}

fn list(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    let classes = crud::list(conn, &CLASSES, params)?;
    let students = store::list(conn, "students")?;

    let enriched: Vec<Value> = classes
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|mut class| {
            let enrollment = enrollment_of(&students, &class);
            class["enrollment"] = json!(enrollment);
            class
        })
        .collect();
    Ok(Value::Array(enriched))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    let outcome = match req.method.as_str() {
        "classes.list" => require_db(state).and_then(|c| list(c, &req.params)),
        "classes.create" => require_db(state).and_then(|c| crud::create(c, &CLASSES, &req.params)),
        "classes.get" => require_db(state).and_then(|c| crud::get(c, &CLASSES, &req.params)),
        "classes.update" => require_db(state).and_then(|c| crud::update(c, &CLASSES, &req.params)),
        "classes.delete" => require_db(state).and_then(|c| crud::delete(c, &CLASSES, &req.params)),
        _ => return None,
    };
    Some(outcome)
}
