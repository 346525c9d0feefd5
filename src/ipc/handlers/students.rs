use super::crud::{self, EntitySchema};
use crate::ipc::error::ApiError;
use crate::ipc::helpers::{require_db, today};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Value};

pub const STUDENTS: EntitySchema = EntitySchema {
    collection: "students",
    code_field: Some("studentId"),
    code_prefix: "STU",
    required: &["firstName", "lastName", "class", "section"],
    statuses: &["Active", "Inactive", "Graduated", "Transferred"],
    default_status: Some("Active"),
    filters: &["status", "class", "section"],
    search: &["firstName", "lastName", "studentId"],
};

const FEE_COMPONENTS: [&str; 5] = [
    "tuitionFee",
    "transportFee",
    "libraryFee",
    "examFee",
    "miscFee",
];

/// Each known component, when present, must be a non-negative number.
fn validate_fee_structure(value: &Value) -> Result<(), ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ApiError::bad_request("feeStructure must be an object"))?;
    for component in FEE_COMPONENTS {
        if let Some(v) = obj.get(component) {
            let amount = v.as_f64().ok_or_else(|| {
                ApiError::bad_request(format!("feeStructure.{} must be a number", component))
            })?;
            if amount < 0.0 {
                return Err(ApiError::bad_request(format!(
                    "feeStructure.{} must not be negative",
                    component
                )));
            }
        }
    }
    Ok(())
}

fn create(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    if let Some(fs) = params.get("feeStructure") {
        validate_fee_structure(fs)?;
    }
    // Admission is stamped at creation unless the caller backfills it.
    let mut params = if params.is_object() {
        params.clone()
    } else {
        json!({})
    };
    if params.get("admissionDate").and_then(|v| v.as_str()).is_none() {
        params["admissionDate"] = json!(today());
    }
    crud::create(conn, &STUDENTS, &params)
}

fn update(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    if let Some(fs) = params.get("patch").and_then(|p| p.get("feeStructure")) {
        validate_fee_structure(fs)?;
    }
    crud::update(conn, &STUDENTS, params)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    let outcome = match req.method.as_str() {
        "students.list" => require_db(state).and_then(|c| crud::list(c, &STUDENTS, &req.params)),
        "students.create" => require_db(state).and_then(|c| create(c, &req.params)),
        "students.get" => require_db(state).and_then(|c| crud::get(c, &STUDENTS, &req.params)),
        "students.update" => require_db(state).and_then(|c| update(c, &req.params)),
        "students.delete" => {
            require_db(state).and_then(|c| crud::delete(c, &STUDENTS, &req.params))
        }
        _ => return None,
    };
    Some(outcome)
}
