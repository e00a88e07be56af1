//! Error handling - every failure becomes an HTML page or a redirect.

use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use quill_core::error::{DomainError, RepoError};

use super::auth::login_url;

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anonymous visitor hit a page that needs a session.
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (title, detail) = match self {
            AppError::LoginRequired { next } => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, login_url(next)))
                    .finish();
            }
            AppError::NotFound(detail) => {
                tracing::debug!("Not found: {}", detail);
                ("Page not found", "The page you requested does not exist.")
            }
            AppError::BadRequest(detail) => {
                tracing::debug!("Bad request: {}", detail);
                ("Bad request", "The request could not be understood.")
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ("Server error", "Something went wrong. Please try again later.")
            }
        };

        HttpResponse::build(self.status_code())
            .content_type(ContentType::html())
            .body(error_page(self.status_code(), title, detail))
    }
}

fn error_page(status: StatusCode, title: &str, detail: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body><h1>{code} {title}</h1><p>{detail}</p><p><a href=\"/\">Back to the front page</a></p></body>\n</html>\n",
        code = status.as_u16(),
    )
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{entity_type} '{key}'"))
            }
            DomainError::InvalidForm(errors) => AppError::BadRequest(errors.to_string()),
            DomainError::Duplicate(msg) => AppError::BadRequest(msg),
            DomainError::Unauthorized => AppError::BadRequest("invalid credentials".to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
            DomainError::Repository(e) => e.into(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::BadRequest(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_required_redirects_with_next() {
        let response = AppError::LoginRequired {
            next: "/new/".to_string(),
        }
        .error_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fnew%2F"
        );
    }

    #[test]
    fn test_missing_entities_are_404() {
        let err: AppError = DomainError::not_found("user", "ghost").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: AppError = DomainError::Unauthorized.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = RepoError::Query("boom".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
