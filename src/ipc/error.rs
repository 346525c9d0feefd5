use serde_json::{json, Value};

pub fn ok(id: &str, data: Value) -> Value {
    json!({
        "id": id,
        "success": true,
        "data": data
    })
}

pub fn fail(id: &str, status: u16, code: &str, message: impl Into<String>) -> Value {
    json!({
        "id": id,
        "success": false,
        "status": status,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

/// Handler-level failure, translated to the nearest taxonomy member.
/// Nothing propagates past the router as an unhandled fault.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: 400,
            code: "bad_params",
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError {
            status: 401,
            code: "unauthorized",
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError {
            status: 403,
            code: "forbidden",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: 404,
            code: "not_found",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: 500,
            code: "internal",
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    pub fn response(self, id: &str) -> Value {
        fail(id, self.status, self.code, self.message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::internal(e.to_string())
    }
}
