use serde_json::{Value, json};
use thiserror::Error;

use kardex_infra::EngineError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("response encoding failed: {0}")]
    Encode(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Engine(e) => e.code(),
            ServiceError::InvalidRequest(_) => "invalid_request",
            ServiceError::Encode(_) => "encode_error",
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        ServiceError::Encode(value.to_string())
    }
}

pub fn service_error_to_response(err: &ServiceError) -> Value {
    match err {
        ServiceError::Engine(EngineError::InsufficientStock {
            requested,
            available,
        }) => json!({
            "error": err.code(),
            "message": err.to_string(),
            "requested": requested,
            "available": available,
        }),
        ServiceError::Engine(e) => json_error(e.code(), e.to_string()),
        ServiceError::InvalidRequest(msg) => json_error(err.code(), msg.clone()),
        ServiceError::Encode(msg) => json_error(err.code(), msg.clone()),
    }
}

pub fn json_error(code: &'static str, message: impl Into<String>) -> Value {
    json!({
        "error": code,
        "message": message.into(),
    })
}
