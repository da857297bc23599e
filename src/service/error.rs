use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    error::{ErrorMessage, HttpError},
    models::bookingmodel::BookingStatus,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "Email already registered",
        Some("users_username_key") => "Username already taken",
        Some("reviews_booking_id_key") => "Review already exists for this booking",
        Some("service_categories_name_key") => "Category already exists",
        Some("service_providers_user_id_key") => "Provider profile already exists",
        _ => "Resource already exists",
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return ServiceError::Conflict(conflict_message(db_err.constraint()).to_string());
            }
        }
        ServiceError::Database(err)
    }
}

impl From<ErrorMessage> for ServiceError {
    fn from(err: ErrorMessage) -> Self {
        match err {
            ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
                ServiceError::BadRequest(err.to_string())
            }
            ErrorMessage::WrongCredentials
            | ErrorMessage::AccountDeactivated
            | ErrorMessage::UserNotAuthenticated
            | ErrorMessage::UserNoLongerExist => ServiceError::Unauthenticated(err.to_string()),
            ErrorMessage::PermissionDenied => ServiceError::Forbidden(err.to_string()),
            ErrorMessage::EmailExist | ErrorMessage::UsernameExist => {
                ServiceError::Conflict(err.to_string())
            }
            ErrorMessage::HashingError | ErrorMessage::InvalidHashFormat | ErrorMessage::ServerError => {
                ServiceError::Internal(err.to_string())
            }
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_)
            | ServiceError::InvalidTransition { .. }
            | ServiceError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => HttpError::server_error(error.to_string()),
            status => HttpError::new(error.to_string(), status),
        }
    }
}
