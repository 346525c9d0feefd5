use crate::db;
use crate::ipc::error::ApiError;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

fn health(state: &AppState) -> Result<Value, ApiError> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
    }))
}

fn workspace_select(state: &mut AppState, params: &Value) -> Result<Value, ApiError> {
    let path = PathBuf::from(required_str(params, "path")?);
    let conn = db::open_db(&path)
        .map_err(|e| ApiError::internal(e.to_string()).with_code("db_open_failed"))?;
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    match req.method.as_str() {
        "health" => Some(health(state)),
        "workspace.select" => Some(workspace_select(state, &req.params)),
        _ => None,
    }
}
