use super::error::ApiError;
use super::types::AppState;
use chrono::Utc;
use rusqlite::Connection;
use serde_json::Value;

pub fn require_db(state: &AppState) -> Result<&Connection, ApiError> {
    state
        .db
        .as_ref()
        .ok_or_else(|| ApiError::internal("select a workspace first").with_code("no_workspace"))
}

pub fn required_str(params: &Value, key: &str) -> Result<String, ApiError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing {}", key)))
}

pub fn optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_array<'a>(params: &'a Value, key: &str) -> Result<&'a Vec<Value>, ApiError> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} must be a non-empty array", key)))
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
