//! HTTP error handling
//!
//! Every failed request returns `{message, code, details?}` with a status
//! derived from the code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use assetgraph_core::{AgentError, EngineError};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "INVALID_INPUT" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UPSTREAM_ERROR" | "DATABASE_ERROR" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<AgentError> for HttpError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::EmptyQuery => HttpError::new("Query cannot be empty", "INVALID_INPUT"),
            AgentError::Model(inner) => HttpError::with_details(
                format!("Error calling model: {}", inner),
                "UPSTREAM_ERROR",
                format!("{:?}", inner),
            ),
        }
    }
}

impl From<EngineError> for HttpError {
    fn from(err: EngineError) -> Self {
        if err.is_validation() {
            HttpError::new(err.to_string(), "VALIDATION_ERROR")
        } else {
            HttpError::new(err.to_string(), "DATABASE_ERROR")
        }
    }
}
