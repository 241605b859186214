//! JSON error envelope for the posts API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use postboard_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::error::ErrorReport;

/// Machine-readable error codes; each fixes the HTTP status it is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    InvalidInput,
    PayloadTooLarge,
    MethodNotAllowed,
    StoreTimeout,
    Store,
    Unavailable,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::InvalidInput => "invalid_input",
            Self::PayloadTooLarge => "payload_too_large",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::StoreTimeout => "store_timeout",
            Self::Store => "store_error",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest | Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::StoreTimeout | Self::Store => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: &'static str) -> Self {
        Self {
            code,
            message,
            hint: None,
            report: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Keep the underlying error chain for logs without exposing it in the body.
    pub fn with_cause(mut self, source: &'static str, cause: &dyn std::error::Error) -> Self {
        self.report = Some(ErrorReport::from_error(source, self.code.status(), cause));
        self
    }

    pub fn method_not_allowed() -> Self {
        Self::new(ErrorCode::MethodNotAllowed, "Method not allowed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let report = self.report.unwrap_or_else(|| {
            let detail = self.hint.as_deref().unwrap_or(self.message);
            ErrorReport::from_message(
                "infra::http::api",
                status,
                format!("{}: {detail}", self.code.as_str()),
            )
        });

        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.as_str().to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}
