use crate::ipc::error::ApiError;
use crate::ipc::helpers::{require_db, today};
use crate::ipc::types::{AppState, Request};
use crate::stats;
use crate::store;
use chrono::{Datelike, Utc};
use rusqlite::Connection;
use serde_json::Value;

/// Reporting view, not a source of truth: four reads and a pure fold.
fn dashboard_stats(conn: &Connection) -> Result<Value, ApiError> {
    let students = store::list(conn, "students")?;
    let teachers = store::list(conn, "teachers")?;
    let fees = store::list(conn, "fees")?;

    let today = today();
    let todays_attendance: Vec<Value> = store::list(conn, "attendance")?
        .into_iter()
        .filter(|r| r.get("date").and_then(|v| v.as_str()) == Some(today.as_str()))
        .collect();

    let now = Utc::now();
    Ok(stats::fold_dashboard(
        &students,
        &teachers,
        &fees,
        &todays_attendance,
        now.year(),
        now.month(),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    match req.method.as_str() {
        "dashboard.stats" => Some(require_db(state).and_then(dashboard_stats)),
        _ => None,
    }
}
