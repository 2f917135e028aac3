use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON error body sent to clients.
///
/// ```json
/// {
///   "status": "fail",
///   "message": "Title not found"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Canonical error messages reused across handlers.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Authentication
    InvalidToken,
    TokenNotProvided,
    UserNotAuthenticated,
    UserNoLongerExist,

    // Authorization
    PermissionDenied,

    // Path resolution
    UserNotFound,
    CategoryNotFound,
    GenreNotFound,
    TitleNotFound,
    ReviewNotFound,
    CommentNotFound,

    // Validation
    DuplicateReview,
    DuplicateSlug,

    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => {
                "You are not logged in, please provide a token".to_string()
            }
            ErrorMessage::UserNotAuthenticated => {
                "Authentication required. Please log in.".to_string()
            }
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::PermissionDenied => {
                "You are not allowed to perform this action".to_string()
            }
            ErrorMessage::UserNotFound => "User not found".to_string(),
            ErrorMessage::CategoryNotFound => "Category not found".to_string(),
            ErrorMessage::GenreNotFound => "Genre not found".to_string(),
            ErrorMessage::TitleNotFound => "Title not found".to_string(),
            ErrorMessage::ReviewNotFound => "Review not found".to_string(),
            ErrorMessage::CommentNotFound => "Comment not found".to_string(),
            ErrorMessage::DuplicateReview => {
                "You have already reviewed this title".to_string()
            }
            ErrorMessage::DuplicateSlug => "Slug already exists".to_string(),
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Error type returned by handlers and middleware; pairs a client-facing
/// message with the HTTP status it maps to.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation failure: malformed payload, out-of-range field,
    /// duplicate unique value.
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// Authenticated but lacking the role or ownership the endpoint demands.
    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::FORBIDDEN,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message.clone(),
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_expected_status() {
        assert_eq!(HttpError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(HttpError::unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(HttpError::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(HttpError::not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(
            HttpError::server_error("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_response_serializes_with_fail_status() {
        let rendered = ErrorResponse {
            status: "fail".to_string(),
            message: ErrorMessage::TitleNotFound.to_string(),
        }
        .to_string();
        assert_eq!(
            rendered,
            r#"{"status":"fail","message":"Title not found"}"#
        );
    }
}
