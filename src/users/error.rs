use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

const ENTITY: &str = "User";

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub property: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(property: &'static str, message: impl Into<String>) -> Self {
        Self {
            property,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("User {0} not found")]
    NotFound(i64),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UserResult<T> = Result<T, UserError>;

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, errors) = match &self {
            UserError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                fields
                    .iter()
                    .map(|f| {
                        json!({
                            "entity": ENTITY,
                            "property": f.property,
                            "message": f.message,
                        })
                    })
                    .collect(),
            ),
            UserError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, vec![json!({ "message": msg })])
            }
            UserError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                vec![json!({ "message": self.to_string() })],
            ),
            UserError::DuplicateEmail(_) => (
                StatusCode::CONFLICT,
                vec![json!({
                    "entity": ENTITY,
                    "property": "email",
                    "message": self.to_string(),
                })],
            ),
            UserError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![json!({ "message": "An internal error occurred" })],
                )
            }
        };

        (status, Json(json!({ "errors": errors }))).into_response()
    }
}
