use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use langdrill_core::error::{ContentError, EngineError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn bad_gateway(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_GATEWAY, code, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::GATEWAY_TIMEOUT, "CONTENT_TIMEOUT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            tracing::error!(code = %self.code, error = %self.message, "request failed");
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            ok: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => Self::validation(message),
            EngineError::Content(e) if e.is_timeout() => Self::gateway_timeout(e.to_string()),
            EngineError::Content(e @ ContentError::Schema(_)) => {
                Self::bad_gateway("CONTENT_INVALID", e.to_string())
            }
            EngineError::Content(e) => Self::bad_gateway("CONTENT_UNAVAILABLE", e.to_string()),
            EngineError::Store(e) => Self {
                code: "STORE_ERROR".to_string(),
                ..Self::internal(e.to_string())
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use langdrill_core::error::{SchemaViolation, StoreError};

    #[test]
    fn engine_errors_map_to_statuses() {
        let cases = [
            (
                EngineError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ContentError::Timeout { after_ms: 10 }.into(),
                StatusCode::GATEWAY_TIMEOUT,
                "CONTENT_TIMEOUT",
            ),
            (
                ContentError::Schema(SchemaViolation::TooFewItems { found: 1, min: 3 }).into(),
                StatusCode::BAD_GATEWAY,
                "CONTENT_INVALID",
            ),
            (
                ContentError::Transport("refused".into()).into(),
                StatusCode::BAD_GATEWAY,
                "CONTENT_UNAVAILABLE",
            ),
            (
                StoreError::Query("locked".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
            assert_eq!(app.code(), code);
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let app: AppError = EngineError::Store(StoreError::Unavailable("/var/db: denied".into())).into();
        assert!(!app.is_operational);
        assert_eq!(app.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
