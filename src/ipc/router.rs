use super::error::{fail, ok, ApiError};
use super::handlers;
use super::types::{AppState, Request};
use serde_json::Value;

fn finish(id: &str, outcome: Result<Value, ApiError>) -> Value {
    match outcome {
        Ok(data) => ok(id, data),
        Err(e) => e.response(id),
    }
}

pub fn handle_request(state: &mut AppState, req: Request) -> Value {
    if let Some(outcome) = handlers::core::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::auth::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::students::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::teachers::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::classes::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::fees::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::attendance::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::dashboard::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }
    if let Some(outcome) = handlers::crud::try_handle(state, &req) {
        return finish(&req.id, outcome);
    }

    fail(
        &req.id,
        404,
        "not_implemented",
        format!("unknown method: {}", req.method),
    )
}
