// Error handling module for the Todo API
// Provides the error taxonomy shared by every handler and its HTTP mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::auth::token::TokenError;
use crate::db::StoreError;

/// Message returned for every 500 response
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Message returned for both unknown usernames and wrong passwords
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Main error type for the API
/// All handlers return `Result<T, ApiError>`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No bearer credential on a protected route (401)
    #[error("missing authentication token")]
    Unauthenticated,

    /// Credential present but malformed or expired (403)
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// Login failed; never says which half was wrong (401)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Request body failed validation (400)
    #[error("validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Body or path could not be parsed into the expected shape (400)
    #[error("malformed request: {message}")]
    MalformedRequest {
        message: String,
        errors: Vec<FieldError>,
    },

    /// Resource absent or not owned by the caller (404)
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Duplicate resource (409)
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Record store failure (500)
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Anything else unexpected (500)
    #[error("internal error: {0}")]
    Internal(String),
}

/// One entry of a validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "name")]
    pub field: String,
    #[schema(example = "length")]
    pub code: String,
    #[schema(example = "Name must be between 1 and 255 characters")]
    pub message: String,
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "NOT_FOUND")]
    pub error: String,

    /// Human-readable message, safe to show to clients
    #[schema(example = "Todo not found")]
    pub message: String,

    /// Field-level details, only present for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_response();
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    /// Convert to a status code and client-facing body, logging at a level
    /// matching the severity. Server-side detail never reaches the body.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let body = match self {
            ApiError::Unauthenticated => {
                debug!("Request without bearer token rejected");
                ErrorResponse::new("UNAUTHORIZED", "Missing authentication token")
            }
            ApiError::InvalidToken(kind) => {
                warn!("Rejected bearer token: {}", kind);
                ErrorResponse::new("FORBIDDEN", "Invalid or expired token")
            }
            ApiError::InvalidCredentials => {
                debug!("Login rejected");
                ErrorResponse::new("INVALID_CREDENTIALS", INVALID_CREDENTIALS_MESSAGE)
            }
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                ErrorResponse {
                    errors: Some(field_errors(errors)),
                    ..ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                }
            }
            ApiError::MalformedRequest { message, errors } => {
                debug!("Malformed request: {}", message);
                ErrorResponse {
                    errors: (!errors.is_empty()).then(|| errors.clone()),
                    ..ErrorResponse::new("BAD_REQUEST", message.clone())
                }
            }
            ApiError::NotFound { resource } => {
                debug!("{} not found", resource);
                ErrorResponse::new("NOT_FOUND", format!("{} not found", resource))
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                ErrorResponse::new("CONFLICT", message.clone())
            }
            ApiError::Store(store_error) => {
                error!("Store error: {:?}", store_error);
                ErrorResponse::new("INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            }
            ApiError::Internal(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                ErrorResponse::new("INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            }
        };
        (status, body)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        let errors = match &rejection {
            JsonRejection::JsonDataError(_) => body_field_error(&message).into_iter().collect(),
            _ => Vec::new(),
        };
        ApiError::MalformedRequest { message, errors }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedRequest {
            message: rejection.body_text(),
            errors: Vec::new(),
        }
    }
}

/// Recover the offending field from a JSON data error
///
/// The text reads `<context>: <path>: <reason>`; errors at the document root
/// carry no path.
fn body_field_error(text: &str) -> Option<FieldError> {
    let (_, detail) = text.split_once("target type: ")?;
    let (path, reason) = detail.split_once(": ")?;
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }
    Some(FieldError {
        field: path.to_string(),
        code: "invalid_type".to_string(),
        message: reason.to_string(),
    })
}

/// Flatten validator output into a list sorted by field name
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                code: e.code.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidToken(TokenError::Expired).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::InvalidToken(TokenError::Malformed).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound { resource: "Todo" }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict { message: "taken".into() }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Store(StoreError::Unavailable("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak_detail() {
        let (status, body) =
            ApiError::Store(StoreError::Unavailable("pg at 10.0.0.3 refused".into()))
                .to_error_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
        assert!(body.errors.is_none());

        let (_, body) = ApiError::Internal("join error: panicked".into()).to_error_response();
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_body_field_error_extracts_path() {
        let field = body_field_error(
            "Failed to deserialize the JSON body into the target type: name: invalid type: integer `5`, expected a string at line 1 column 10",
        )
        .expect("field");
        assert_eq!(field.field, "name");
        assert_eq!(field.code, "invalid_type");
        assert!(field.message.starts_with("invalid type: integer"));
    }

    #[test]
    fn test_body_field_error_ignores_root_errors() {
        assert!(body_field_error(
            "Failed to deserialize the JSON body into the target type: invalid type: sequence, expected struct CreateTodoRequest at line 1 column 0"
        )
        .is_none());
        assert!(body_field_error("Expected request with `Content-Type: application/json`").is_none());
    }

    #[test]
    fn test_malformed_request_is_bad_request() {
        let (status, body) = ApiError::MalformedRequest {
            message: "Invalid URL".into(),
            errors: Vec::new(),
        }
        .to_error_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "BAD_REQUEST");
        assert!(body.errors.is_none());
    }

    #[test]
    fn test_validation_errors_are_listed_per_field() {
        let mut errors = ValidationErrors::new();
        let mut too_long = ValidationError::new("length");
        too_long.message = Some("too long".into());
        errors.add("name", too_long);
        errors.add("age", ValidationError::new("range"));

        let (status, body) = ApiError::ValidationError(errors).to_error_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields = body.errors.expect("field errors");
        assert_eq!(
            fields,
            vec![
                FieldError {
                    field: "age".into(),
                    code: "range".into(),
                    message: "range".into(),
                },
                FieldError {
                    field: "name".into(),
                    code: "length".into(),
                    message: "too long".into(),
                },
            ]
        );
    }
}
