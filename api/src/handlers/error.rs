//! Mapping of domain outcomes onto HTTP responses

use actix_web::error::JsonPayloadError;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use std::collections::HashMap;
use validator::ValidationErrors;

use og_core::errors::{DomainError, OtpError};
use og_shared::errors::{error_codes, ErrorResponse};

/// Error returned by every handler
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Request validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        ApiError::Domain(DomainError::Otp(err))
    }
}

/// Status code and envelope of a flow outcome
fn otp_error_parts(err: &OtpError) -> (StatusCode, ErrorResponse) {
    let message = err.to_string();
    match err {
        OtpError::InvalidIdentifier => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::IDENTIFIER_INVALID, message),
        ),
        OtpError::MalformedCode { expected_length } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::CODE_MALFORMED, message)
                .add_detail("expected_length", expected_length),
        ),
        OtpError::InvalidCode { attempts_remaining } => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::CODE_INVALID, message)
                .add_detail("attempts_remaining", attempts_remaining),
        ),
        OtpError::InvalidResetToken => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::RESET_TOKEN_INVALID, message),
        ),
        OtpError::SessionNotFound => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(error_codes::SESSION_NOT_FOUND, message),
        ),
        OtpError::AlreadyConsumed => (
            StatusCode::CONFLICT,
            ErrorResponse::new(error_codes::ALREADY_CONSUMED, message),
        ),
        OtpError::NotVerified => (
            StatusCode::CONFLICT,
            ErrorResponse::new(error_codes::NOT_VERIFIED, message),
        ),
        OtpError::ExpiredSession => (
            StatusCode::GONE,
            ErrorResponse::new(error_codes::SESSION_EXPIRED, message),
        ),
        OtpError::MaxAttemptsExceeded => (
            StatusCode::LOCKED,
            ErrorResponse::new(error_codes::MAX_ATTEMPTS_EXCEEDED, message)
                .add_detail("attempts_remaining", 0),
        ),
        OtpError::CooldownActive { retry_after_seconds } => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse::new(error_codes::COOLDOWN_ACTIVE, message)
                .add_detail("retry_after_seconds", retry_after_seconds),
        ),
        OtpError::MaxResendsReached { max_resends } => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse::new(error_codes::MAX_RESENDS_REACHED, message)
                .add_detail("max_resends", max_resends),
        ),
        OtpError::DeliveryFailure { attempts } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::new(error_codes::DELIVERY_FAILED, "Code could not be delivered. Please try again later")
                .add_detail("attempts", attempts),
        ),
    }
}

fn validation_details(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl ApiError {
    fn parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Domain(DomainError::Otp(err)) => otp_error_parts(err),
            ApiError::Domain(DomainError::Validation { message }) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone()),
            ),
            ApiError::Domain(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred"),
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data")
                    .add_detail("fields", validation_details(errors)),
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::BAD_REQUEST, message.clone()),
            ),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, body) = self.parts();

        match self {
            ApiError::Domain(err) if err.is_fatal() => {
                tracing::error!(error = %err, status = status.as_u16(), "Request failed");
            }
            _ => {
                tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            }
        }

        let mut response = HttpResponse::build(status);
        if let ApiError::Domain(DomainError::Otp(OtpError::CooldownActive { retry_after_seconds })) = self {
            response.insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()));
        }
        response.json(body)
    }
}

/// Turn malformed JSON bodies into the shared error envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
