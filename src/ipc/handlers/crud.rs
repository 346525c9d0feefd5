//! Generic validated CRUD, parameterized by an entity schema.
//!
//! Every resource family shares the same read/write shape: validate inputs,
//! look the document up, branch, write. The genuinely special rules (fee
//! generation, bulk attendance, the dashboard fold) stay bespoke; everything
//! else routes through here.

use crate::ipc::error::ApiError;
use crate::ipc::helpers::{now_rfc3339, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub struct EntitySchema {
    pub collection: &'static str,
    /// Human-readable generated code, e.g. studentId = STU0001.
    pub code_field: Option<&'static str>,
    pub code_prefix: &'static str,
    pub required: &'static [&'static str],
    /// Allowed values for the `status` field; empty means no status policy.
    pub statuses: &'static [&'static str],
    pub default_status: Option<&'static str>,
    /// Equality filters accepted by `list`.
    pub filters: &'static [&'static str],
    /// Fields covered by the `search` substring filter.
    pub search: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub enum Op {
    List,
    Create,
    Get,
    Update,
    Delete,
}

fn validate_status(schema: &EntitySchema, value: &str) -> Result<(), ApiError> {
    if schema.statuses.is_empty() || schema.statuses.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "status must be one of {}",
            schema.statuses.join(", ")
        )))
    }
}

pub fn create(conn: &Connection, schema: &EntitySchema, params: &Value) -> Result<Value, ApiError> {
    for &key in schema.required {
        required_str(params, key)?;
    }

    let mut body = params.as_object().cloned().unwrap_or_default();
    body.remove("token");

    match optional_str(params, "status") {
        Some(status) => validate_status(schema, &status)?,
        None => {
            if let Some(default) = schema.default_status {
                body.insert("status".to_string(), json!(default));
            }
        }
    }

    let id = Uuid::new_v4().to_string();
    body.insert("id".to_string(), json!(id.clone()));
    body.insert("createdAt".to_string(), json!(now_rfc3339()));

    let mut result = Map::new();
    result.insert("id".to_string(), json!(id.clone()));
    if let Some(code_field) = schema.code_field {
        let seq = store::next_sequence(conn, &format!("seq:{}", schema.collection))?;
        let code = store::format_code(schema.code_prefix, seq);
        body.insert(code_field.to_string(), json!(code.clone()));
        result.insert(code_field.to_string(), json!(code));
    }

    store::insert(conn, schema.collection, &id, &Value::Object(body))?;
    Ok(Value::Object(result))
}

fn matches_filters(schema: &EntitySchema, params: &Value, doc: &Value) -> bool {
    for &field in schema.filters {
        if let Some(want) = optional_str(params, field) {
            if doc.get(field).and_then(|v| v.as_str()) != Some(want.as_str()) {
                return false;
            }
        }
    }
    if let Some(query) = optional_str(params, "search") {
        let query = query.to_lowercase();
        let hit = schema.search.iter().any(|&field| {
            doc.get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.to_lowercase().contains(&query))
                .unwrap_or(false)
        });
        if !hit {
            return false;
        }
    }
    true
}

pub fn list(conn: &Connection, schema: &EntitySchema, params: &Value) -> Result<Value, ApiError> {
    let all = store::list(conn, schema.collection)?;
    let filtered: Vec<Value> = all
        .into_iter()
        .filter(|doc| matches_filters(schema, params, doc))
        .collect();
    Ok(Value::Array(filtered))
}

pub fn get(conn: &Connection, schema: &EntitySchema, params: &Value) -> Result<Value, ApiError> {
    let id = required_str(params, "id")?;
    store::get(conn, schema.collection, &id)?
        .ok_or_else(|| ApiError::not_found(format!("{} record not found", schema.collection)))
}

pub fn update(conn: &Connection, schema: &EntitySchema, params: &Value) -> Result<Value, ApiError> {
    let id = required_str(params, "id")?;
    let patch = params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ApiError::bad_request("missing patch object"))?;

    if let Some(status) = patch.get("status").and_then(|v| v.as_str()) {
        validate_status(schema, status)?;
    }

    let mut doc = store::get(conn, schema.collection, &id)?
        .ok_or_else(|| ApiError::not_found(format!("{} record not found", schema.collection)))?;
    let body = doc
        .as_object_mut()
        .ok_or_else(|| ApiError::internal("stored document is not an object"))?;

    for (key, value) in patch {
        // Identity and provenance fields are server-owned.
        if key == "id" || key == "createdAt" || Some(key.as_str()) == schema.code_field {
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
    body.insert("updatedAt".to_string(), json!(now_rfc3339()));

    store::replace(conn, schema.collection, &id, &doc)?;
    Ok(json!({ "updated": true }))
}

pub fn delete(conn: &Connection, schema: &EntitySchema, params: &Value) -> Result<Value, ApiError> {
    let id = required_str(params, "id")?;
    if !store::remove(conn, schema.collection, &id)? {
        return Err(ApiError::not_found(format!(
            "{} record not found",
            schema.collection
        )));
    }
    Ok(json!({ "deleted": true }))
}

pub fn apply(
    conn: &Connection,
    schema: &EntitySchema,
    op: Op,
    params: &Value,
) -> Result<Value, ApiError> {
    match op {
        Op::List => list(conn, schema, params),
        Op::Create => create(conn, schema, params),
        Op::Get => get(conn, schema, params),
        Op::Update => update(conn, schema, params),
        Op::Delete => delete(conn, schema, params),
    }
}

pub fn op_for(name: &str) -> Option<Op> {
    match name {
        "list" => Some(Op::List),
        "create" => Some(Op::Create),
        "get" => Some(Op::Get),
        "update" => Some(Op::Update),
        "delete" => Some(Op::Delete),
        _ => None,
    }
}

// Plain families with no bespoke rules route straight through the generic ops.

const ANNOUNCEMENTS: EntitySchema = EntitySchema {
    collection: "announcements",
    code_field: None,
    code_prefix: "",
    required: &["title", "content"],
    statuses: &[],
    default_status: None,
    filters: &["audience"],
    search: &["title", "content"],
};

const EXAMS: EntitySchema = EntitySchema {
    collection: "exams",
    code_field: None,
    code_prefix: "",
    required: &["name", "class", "date"],
    statuses: &[],
    default_status: None,
    filters: &["class", "date"],
    search: &["name"],
};

const GRADES: EntitySchema = EntitySchema {
    collection: "grades",
    code_field: None,
    code_prefix: "",
    required: &["studentId", "examId", "subject"],
    statuses: &[],
    default_status: None,
    filters: &["studentId", "examId", "subject"],
    search: &[],
};

const MESSAGES: EntitySchema = EntitySchema {
    collection: "messages",
    code_field: None,
    code_prefix: "",
    required: &["senderId", "recipientId", "content"],
    statuses: &[],
    default_status: None,
    filters: &["recipientId", "senderId"],
    search: &["content"],
};

fn schema_for(family: &str) -> Option<&'static EntitySchema> {
    match family {
        "announcements" => Some(&ANNOUNCEMENTS),
        "exams" => Some(&EXAMS),
        "grades" => Some(&GRADES),
        "messages" => Some(&MESSAGES),
        _ => None,
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    let (family, op_name) = req.method.split_once('.')?;
    let schema = schema_for(family)?;
    let op = op_for(op_name)?;
    Some(
        crate::ipc::helpers::require_db(state)
            .and_then(|conn| apply(conn, schema, op, &req.params)),
    )
}
