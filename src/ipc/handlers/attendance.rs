use crate::auth::{self, AuthUser};
use crate::ipc::error::ApiError;
use crate::ipc::helpers::{now_rfc3339, optional_str, require_db, required_array, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

const STATUSES: [&str; 3] = ["Present", "Late", "Absent"];

struct Entry {
    student_id: String,
    status: String,
    remark: Option<String>,
}

fn authenticate(params: &Value) -> Result<AuthUser, ApiError> {
    let token = params
        .get("token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::unauthorized("missing token"))?;
    auth::verify_token(token).ok_or_else(|| ApiError::unauthorized("invalid token"))
}

fn require_class_access(
    conn: &Connection,
    user: &AuthUser,
    class_id: &str,
) -> Result<(), ApiError> {
    if auth::can_access_class(conn, user, class_id)? {
        Ok(())
    } else {
        Err(ApiError::forbidden("no access to this class"))
    }
}

fn parse_date(raw: &str) -> Result<String, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| raw.to_string())
        .map_err(|_| ApiError::bad_request("date must be YYYY-MM-DD"))
}

/// All entries are validated before anything is written.
fn parse_entries(params: &Value) -> Result<Vec<Entry>, ApiError> {
    let raw = required_array(params, "entries")?;
    let mut entries = Vec::with_capacity(raw.len());
    for item in raw {
        let student_id = required_str(item, "studentId")?;
        let status = required_str(item, "status")?;
        if !STATUSES.contains(&status.as_str()) {
            return Err(ApiError::bad_request(format!(
                "status must be one of {}",
                STATUSES.join(", ")
            )));
        }
        entries.push(Entry {
            student_id,
            status,
            remark: optional_str(item, "remark"),
        });
    }
    Ok(entries)
}

fn records_for_day(conn: &Connection, class_id: &str, date: &str) -> Result<Vec<Value>, ApiError> {
    let all = store::list(conn, "attendance")?;
    Ok(all
        .into_iter()
        .filter(|r| {
            r.get("classId").and_then(|v| v.as_str()) == Some(class_id)
                && r.get("date").and_then(|v| v.as_str()) == Some(date)
        })
        .collect())
}

fn bulk_create(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    let user = authenticate(params)?;
    let class_id = required_str(params, "classId")?;
    let date = parse_date(&required_str(params, "date")?)?;
    let entries = parse_entries(params)?;
    require_class_access(conn, &user, &class_id)?;

    // One existing record is proof the roster was already processed that day.
    if !records_for_day(conn, &class_id, &date)?.is_empty() {
        return Err(ApiError::bad_request(format!(
            "attendance already marked for class {} on {}",
            class_id, date
        ))
        .with_code("already_marked"));
    }

    let marked_at = now_rfc3339();
    let tx = conn.unchecked_transaction()?;
    for entry in &entries {
        let id = Uuid::new_v4().to_string();
        let mut body = json!({
            "id": id.clone(),
            "classId": class_id,
            "studentId": entry.student_id,
            "date": date,
            "status": entry.status,
            "markedBy": user.username,
            "markedAt": marked_at,
        });
        if let Some(remark) = &entry.remark {
            body["remark"] = json!(remark);
        }
        store::insert(&tx, "attendance", &id, &body)?;
    }
    tx.commit()
        .map_err(|e| ApiError::internal(e.to_string()).with_code("db_commit_failed"))?;

    Ok(json!({ "insertedCount": entries.len() }))
}

fn bulk_update(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    let user = authenticate(params)?;
    let class_id = required_str(params, "classId")?;
    let date = parse_date(&required_str(params, "date")?)?;
    let entries = parse_entries(params)?;
    require_class_access(conn, &user, &class_id)?;

    let mut by_student: HashMap<String, Value> = HashMap::new();
    for rec in records_for_day(conn, &class_id, &date)? {
        if let Some(sid) = rec.get("studentId").and_then(|v| v.as_str()) {
            by_student.insert(sid.to_string(), rec);
        }
    }

    // Entries with no matching record are skipped, not errors.
    let mut modified = 0usize;
    for entry in &entries {
        let Some(doc) = by_student.get_mut(&entry.student_id) else {
            continue;
        };
        doc["status"] = json!(entry.status);
        match &entry.remark {
            Some(remark) => doc["remark"] = json!(remark),
            None => {
                if let Some(obj) = doc.as_object_mut() {
                    obj.remove("remark");
                }
            }
        }
        doc["updatedAt"] = json!(now_rfc3339());
        let id = doc
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ApiError::internal("attendance record missing id"))?
            .to_string();
        if store::replace(conn, "attendance", &id, doc)? {
            modified += 1;
        }
    }

    Ok(json!({ "modifiedCount": modified }))
}

fn list(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    let class_id = optional_str(params, "classId");
    let date = optional_str(params, "date");
    let all = store::list(conn, "attendance")?;
    let filtered: Vec<Value> = all
        .into_iter()
        .filter(|r| {
            class_id
                .as_deref()
                .map(|c| r.get("classId").and_then(|v| v.as_str()) == Some(c))
                .unwrap_or(true)
                && date
                    .as_deref()
                    .map(|d| r.get("date").and_then(|v| v.as_str()) == Some(d))
                    .unwrap_or(true)
        })
        .collect();
    Ok(Value::Array(filtered))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    let outcome = match req.method.as_str() {
        "attendance.bulkCreate" => require_db(state).and_then(|c| bulk_create(c, &req.params)),
        "attendance.bulkUpdate" => require_db(state).and_then(|c| bulk_update(c, &req.params)),
        "attendance.list" => require_db(state).and_then(|c| list(c, &req.params)),
        _ => return None,
    };
    Some(outcome)
}
