use super::crud::{self, EntitySchema};
use crate::fees;
use crate::ipc::error::ApiError;
use crate::ipc::helpers::{now_rfc3339, optional_str, require_db, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store;
use chrono::{Datelike, Utc};
use rusqlite::Connection;
use serde_json::{json, Value};
use uuid::Uuid;

const FEE_STATUSES: [&str; 4] = ["Pending", "Paid", "Overdue", "Partial"];

pub const FEES: EntitySchema = EntitySchema {
    collection: "fees",
    code_field: None,
    code_prefix: "",
    required: &[],
    statuses: &["Pending", "Paid", "Overdue", "Partial"],
    default_status: Some("Pending"),
    filters: &["studentId", "status", "billNumber"],
    search: &["studentName", "billNumber"],
};

fn validate_status(status: &str) -> Result<(), ApiError> {
    if FEE_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "status must be one of {}",
            FEE_STATUSES.join(", ")
        )))
    }
}

/// Explicit items are accepted as-is, but each must name a fee type and a
/// numeric amount.
fn parse_explicit_items(raw: &[Value]) -> Result<Vec<Value>, ApiError> {
    let mut items = Vec::with_capacity(raw.len());
    for item in raw {
        let fee_type = item
            .get("feeType")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("each item needs a feeType"))?;
        let amount = item
            .get("amount")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ApiError::bad_request("each item needs a numeric amount"))?;
        let description = item
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        items.push(json!({
            "feeType": fee_type,
            "amount": amount,
            "description": description,
        }));
    }
    Ok(items)
}

fn create(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    let student_id = required_str(params, "studentId")?;
    let student = store::get(conn, "students", &student_id)?
        .ok_or_else(|| ApiError::not_found("student not found"))?;

    // Denormalized for read convenience; fee records never point back.
    let student_name = format!(
        "{} {}",
        student.get("firstName").and_then(|v| v.as_str()).unwrap_or(""),
        student.get("lastName").and_then(|v| v.as_str()).unwrap_or("")
    )
    .trim()
    .to_string();
    let class_section = format!(
        "{}-{}",
        student.get("class").and_then(|v| v.as_str()).unwrap_or(""),
        student.get("section").and_then(|v| v.as_str()).unwrap_or("")
    );

    let explicit = params.get("items").and_then(|v| v.as_array());
    let (items, explicit_supplied) = match explicit {
        Some(raw) if !raw.is_empty() => (parse_explicit_items(raw)?, true),
        _ => {
            let structure = student.get("feeStructure").cloned().unwrap_or(json!({}));
            (fees::items_from_structure(&structure), false)
        }
    };

    // Auto-generated schedules keep total = sum of items; manually supplied
    // items may carry their own total and are accepted as-is.
    let total_amount = if explicit_supplied {
        params
            .get("totalAmount")
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| fees::total_of(&items))
    } else {
        fees::total_of(&items)
    };

    let status = match optional_str(params, "status") {
        Some(s) => {
            validate_status(&s)?;
            s
        }
        None => "Pending".to_string(),
    };

    let bill_number = match optional_str(params, "billNumber") {
        Some(n) => n,
        None => {
            let now = Utc::now();
            let seq = store::next_sequence(
                conn,
                &format!("bill:{:04}-{:02}", now.year(), now.month()),
            )?;
            fees::format_bill_number(now.year(), now.month(), seq)
        }
    };

    let id = Uuid::new_v4().to_string();
    let mut body = json!({
        "id": id.clone(),
        "studentId": student_id,
        "studentName": student_name,
        "classSection": class_section,
        "items": items,
        "totalAmount": total_amount,
        "status": status,
        "billNumber": bill_number.clone(),
        "createdAt": now_rfc3339(),
    });
    if let Some(due) = optional_str(params, "dueDate") {
        body["dueDate"] = json!(due);
    }

    store::insert(conn, "fees", &id, &body)?;
    Ok(json!({ "id": id, "billNumber": bill_number }))
}

fn update_status(conn: &Connection, params: &Value) -> Result<Value, ApiError> {
    let id = required_str(params, "id")?;
    let status = required_str(params, "status")?;
    validate_status(&status)?;

    let mut doc = store::get(conn, "fees", &id)?
        .ok_or_else(|| ApiError::not_found("fee record not found"))?;
    doc["status"] = json!(status);
    doc["updatedAt"] = json!(now_rfc3339());

    store::replace(conn, "fees", &id, &doc)?;
    Ok(json!({ "updated": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    let outcome = match req.method.as_str() {
        "fees.create" => require_db(state).and_then(|c| create(c, &req.params)),
        "fees.list" => require_db(state).and_then(|c| crud::list(c, &FEES, &req.params)),
        "fees.get" => require_db(state).and_then(|c| crud::get(c, &FEES, &req.params)),
        "fees.updateStatus" => require_db(state).and_then(|c| update_status(c, &req.params)),
        _ => return None,
    };
    Some(outcome)
}
