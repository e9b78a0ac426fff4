//! Application state and factory
//!
//! This module holds the shared state handed to every handler and the route
//! table of the Actix-web application.

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use og_core::services::verification::{
    CredentialUpdater, DeliveryProvider, SessionStore, VerificationService,
};
use og_shared::errors::ErrorResponse;

use crate::handlers::json_error_handler;
use crate::routes::{health, otp, password};

/// Verification service wired with the collaborators chosen at start-up
pub type OtpService = VerificationService<dyn DeliveryProvider, dyn SessionStore, dyn CredentialUpdater>;

/// Application state that holds shared services
pub struct AppState {
    pub verification: Arc<OtpService>,
}

impl AppState {
    pub fn new(verification: Arc<OtpService>) -> Self {
        Self { verification }
    }
}

/// Register every route and the JSON extractor configuration
///
/// Used by the server and by the route tests, each wrapping the result in
/// their own `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/otp")
                        .route("/request", web::post().to(otp::request_code))
                        .route("/resend", web::post().to(otp::resend_code))
                        .route("/verify", web::post().to(otp::verify_code))
                        .route("/sessions/{session_id}", web::get().to(otp::session_status)),
                )
                .service(
                    web::scope("/password")
                        .route("/reset-token", web::post().to(password::issue_reset_token))
                        .route("/reset", web::post().to(password::reset_password)),
                ),
        )
        .default_service(web::route().to(not_found));
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "NOT_FOUND",
        "The requested resource was not found",
    ))
}
