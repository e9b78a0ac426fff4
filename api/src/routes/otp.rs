//! One-time code endpoints

use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use og_core::errors::OtpError;

use crate::app::AppState;
use crate::dto::{RequestCodeRequest, ResendCodeRequest, VerifyCodeRequest};
use crate::handlers::ApiError;

/// Handler for POST /api/v1/otp/request
///
/// Sends a code to the identifier and returns the session the caller uses for
/// every later call. A second request while a session is pending is treated
/// as a resend of that session.
///
/// # Request Body
///
/// ```json
/// { "identifier": "+97612345678" }
/// ```
///
/// # Response
///
/// ```json
/// {
///     "session_id": "550e8400-e29b-41d4-a716-446655440000",
///     "cooldown_seconds": 60,
///     "expires_at": "2025-08-14T10:10:00Z"
/// }
/// ```
pub async fn request_code(
    state: web::Data<AppState>,
    request: web::Json<RequestCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let result = state.verification.request_code(&request.identifier).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Handler for POST /api/v1/otp/resend
pub async fn resend_code(
    state: web::Data<AppState>,
    request: web::Json<ResendCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = state.verification.resend_code(&request.session_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Handler for POST /api/v1/otp/verify
///
/// Wrong codes answer 401 with `attempts_remaining`; the last wrong code
/// locks the session (423).
pub async fn verify_code(
    state: web::Data<AppState>,
    request: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let result = state
        .verification
        .verify_code(&request.session_id, &request.code)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Handler for GET /api/v1/otp/sessions/{session_id}
pub async fn session_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    // An id that cannot exist is reported like any other unknown session
    let session_id = Uuid::parse_str(&path.into_inner()).map_err(|_| OtpError::SessionNotFound)?;

    let snapshot = state.verification.session_status(&session_id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}
