use crate::auth;
use crate::ipc::error::ApiError;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use chrono::Utc;
use serde_json::{json, Value};

fn login(params: &Value) -> Result<Value, ApiError> {
    let username = required_str(params, "username")?;
    let password = required_str(params, "password")?;

    let user = auth::login(&username, &password).ok_or_else(|| {
        ApiError::unauthorized("invalid credentials").with_code("invalid_credentials")
    })?;

    let token = auth::issue_token(&user.username, &user.role, Utc::now().timestamp());
    Ok(json!({
        "token": token,
        "user": {
            "username": user.username,
            "role": user.role,
        }
    }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Result<Value, ApiError>> {
    match req.method.as_str() {
        "auth.login" => Some(login(&req.params)),
        _ => None,
    }
}
