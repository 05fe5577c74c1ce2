// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

use crate::models::question::{QuestionId, QuestionType};

/// A single violated rule, reported back to whoever filled in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Flattens `validator` output into a list sorted by field name.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Vec<FieldError> {
        let mut out: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                list.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    FieldError::new(field.to_string(), err.code.to_string(), message)
                })
            })
            .collect();
        // field_errors() is a HashMap
        out.sort_by(|a, b| a.field.cmp(&b.field));
        out
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors raised by the quiz editor and the question dialog.
/// All of them are local and recoverable: the caller fixes the input and retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    QuestionNotFound(QuestionId),

    /// One or more fields fail validation. Blocks add/update/save.
    Invalid(Vec<FieldError>),

    /// A question keeps the type it was created with.
    TypeChange {
        from: QuestionType,
        to: QuestionType,
    },

    DialogClosed,

    /// The dialog command does not exist for the active question type.
    NotApplicable {
        action: &'static str,
        question_type: QuestionType,
    },

    OptionOutOfRange {
        index: usize,
        len: usize,
    },

    TooFewOptions {
        min: usize,
    },
}

impl EditorError {
    /// Convenience for a validation failure on a single field.
    pub fn invalid(field: &str, code: &str, message: &str) -> Self {
        EditorError::Invalid(vec![FieldError::new(field, code, message)])
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::QuestionNotFound(id) => write!(f, "Question {} not found", id),
            EditorError::Invalid(errors) => {
                let list: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "Validation failed: {}", list.join("; "))
            }
            EditorError::TypeChange { from, to } => write!(
                f,
                "Question type cannot change from {} to {}",
                from.as_str(),
                to.as_str()
            ),
            EditorError::DialogClosed => write!(f, "Question dialog is not open"),
            EditorError::NotApplicable {
                action,
                question_type,
            } => write!(
                f,
                "'{}' is not available for {} questions",
                action,
                question_type.as_str()
            ),
            EditorError::OptionOutOfRange { index, len } => {
                write!(f, "Option index {} out of range (0..{})", index, len)
            }
            EditorError::TooFewOptions { min } => {
                write!(f, "A question needs at least {} option slots", min)
            }
        }
    }
}

impl std::error::Error for EditorError {}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 400 Bad Request with per-field details
    Validation(Vec<FieldError>),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., dialog closed, session cap reached)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "details": details }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EditorError> for AppError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::QuestionNotFound(_) => AppError::NotFound(err.to_string()),
            EditorError::Invalid(details) => AppError::Validation(details),
            EditorError::DialogClosed => AppError::Conflict(err.to_string()),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}
