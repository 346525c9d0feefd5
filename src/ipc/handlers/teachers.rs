use super::crud::{self, EntitySchema};
use crate::ipc::error::ApiError;
use crate::ipc::helpers::{now_rfc3339, require_db, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::{json, Value};
use uuid::Uuid;

pub const TEACHERS: EntitySchema = EntitySchema {
    collection: "teachers",
    code_field: Some("teacherId"),
    code_prefix: "TCH",
    required: &["firstName", "lastName"],
    statuses: &["Active", "Inactive"],
    default_status: Some("Active"),
    filters: &["status", "subject"],
    search: &["firstName", "lastName", "teacherId"],
};

fn load_teacher(conn: &Connection, id: &str) -> Result<Value, ApiError> {
    store::get(conn, "teachers", id)?
        .ok_or_else(|| ApiError::not_found("teachers record not found"))
}

/// Append an entry to one of the teacher's nested collections
/// (qualifications, achievements, experience). Entries get a generated
/// sub-identifier so they stay independently addressable.
fn entry_add(conn: &Connection, params: &Value, field: &str) -> Result<Value, ApiError> {
    let id = required_str(params, "id")?;
    let entry = params
        .get("entry")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ApiError::bad_request("missing entry object"))?;

    let mut doc = load_teacher(conn, &id)?;
    let entry_id = Uuid::new_v4().to_string();
    let mut entry = entry.clone();
    entry.insert("entryId".to_string(), json!(entry_id.clone()));
    entry.insert("addedAt".to_string(), json!(now_rfc3339()));

    if doc.get(field).and_then(|v| v.as_array()).is_none() {
        doc[field] = json!([]);
    }
    doc[field]
        .as_array_mut()
        .ok_or_else(|| ApiError::internal("nested collection is not an array"))?
        .push(Value::Object(entry));

    store::replace(conn, "teachers", &id, &doc)?;
    Ok(json!({ "entryId": entry_id }))
}

fn entry_remove(conn: &Connection, params: &Value, field: &str) -> Result<Value, ApiError> {
    let id = required_str(params, "id")?;
    let entry_id = required_str(params, "entryId")?;

    let mut doc = load_teacher(conn, &id)?;
    let Some(entries) = doc.get_mut(field).and_then(|v| v.as_array_mut()) else {
        return Err(ApiError::not_found("entry not found"));
    };
    let before = entries.len();
    entries.retain(|e| e.get("entryId").and_then(|v| v.as_str()) != Some(entry_id.as_str()));
    if entries.len() == before {
        return Err(ApiError::not_found("entry not found"));
    }

    store::replace(conn, "teachers", &id, &doc)?;
    Ok(json!({ "removed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    let outcome = match req.method.as_str() {
        "teachers.list" => require_db(state).and_then(|c| crud::list(c, &TEACHERS, &req.params)),
        "teachers.create" => {
            require_db(state).and_then(|c| crud::create(c, &TEACHERS, &req.params))
        }
        "teachers.get" => require_db(state).and_then(|c| crud::get(c, &TEACHERS, &req.params)),
        "teachers.update" => {
            require_db(state).and_then(|c| crud::update(c, &TEACHERS, &req.params))
        }
        "teachers.delete" => {
            require_db(state).and_then(|c| crud::delete(c, &TEACHERS, &req.params))
        }
        "teachers.addQualification" => {
            require_db(state).and_then(|c| entry_add(c, &req.params, "qualifications"))
        }
        "teachers.removeQualification" => {
            require_db(state).and_then(|c| entry_remove(c, &req.params, "qualifications"))
        }
        "teachers.addAchievement" => {
            require_db(state).and_then(|c| entry_add(c, &req.params, "achievements"))
        }
        "teachers.removeAchievement" => {
            require_db(state).and_then(|c| entry_remove(c, &req.params, "achievements"))
        }
        "teachers.addExperience" => {
            require_db(state).and_then(|c| entry_add(c, &req.params, "experience"))
        }
        "teachers.removeExperience" => {
            require_db(state).and_then(|c| entry_remove(c, &req.params, "experience"))
        }
        _ => return None,
    };
    Some(outcome)
}
