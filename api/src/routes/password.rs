//! Credential reset endpoints
//!
//! Both operate on a session that passed code verification.

use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app::AppState;
use crate::dto::{ResetPasswordRequest, ResetTokenRequest};
use crate::handlers::ApiError;

/// Handler for POST /api/v1/password/reset-token
///
/// Issues the opaque token embedded in a reset link. Re-issuing invalidates
/// the previous token.
pub async fn issue_reset_token(
    state: web::Data<AppState>,
    request: web::Json<ResetTokenRequest>,
) -> Result<HttpResponse, ApiError> {
    let issued = state.verification.issue_reset_token(&request.session_id).await?;
    Ok(HttpResponse::Ok().json(issued))
}

/// Handler for POST /api/v1/password/reset
///
/// With `reset_token` the token must match the one last issued for the
/// session; without it the verified session alone authorizes the reset.
pub async fn reset_password(
    state: web::Data<AppState>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let result = match &request.reset_token {
        Some(token) => {
            state
                .verification
                .consume_with_token(&request.session_id, token, &request.new_password)
                .await?
        }
        None => {
            state
                .verification
                .consume_for_reset(&request.session_id, &request.new_password)
                .await?
        }
    };
    Ok(HttpResponse::Ok().json(result))
}
