//! Route tests running the real service against in-memory collaborators

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use og_api::{configure, AppState, OtpService};
use og_core::services::verification::{
    DeliveryError, DeliveryProvider, DeliveryReceipt, VerificationServiceConfig,
};
use og_infra::credentials::InMemoryCredentialStore;
use og_infra::store::InMemorySessionStore;

/// Keeps every message so tests can read the code back
#[derive(Default)]
struct CapturingProvider {
    messages: Mutex<Vec<(String, String)>>,
}

impl CapturingProvider {
    fn last_code(&self) -> String {
        let messages = self.messages.lock().unwrap();
        let (_, body) = messages.last().expect("no message sent");
        body.split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .expect("no code in message")
            .to_string()
    }
}

#[async_trait]
impl DeliveryProvider for CapturingProvider {
    async fn send(&self, destination: &str, message: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push((destination.to_string(), message.to_string()));
        Ok(DeliveryReceipt {
            message_id: format!("msg-{}", messages.len()),
            provider: "capture".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "capture"
    }
}

struct TestContext {
    state: web::Data<AppState>,
    provider: Arc<CapturingProvider>,
    credentials: Arc<InMemoryCredentialStore>,
}

fn context() -> TestContext {
    let provider = Arc::new(CapturingProvider::default());
    let credentials = Arc::new(InMemoryCredentialStore::new(4, 8));
    let config = VerificationServiceConfig::default();

    let service = OtpService::new(
        provider.clone(),
        Arc::new(InMemorySessionStore::new()),
        credentials.clone(),
        config,
    );

    TestContext {
        state: web::Data::new(AppState::new(Arc::new(service))),
        provider,
        credentials,
    }
}

fn wrong_code(code: &str) -> &'static str {
    if code == "000000" {
        "111111"
    } else {
        "000000"
    }
}

macro_rules! app {
    ($ctx:expr) => {
        test::init_service(App::new().app_data($ctx.state.clone()).configure(configure)).await
    };
}

macro_rules! post {
    ($app:expr, $path:expr, $body:expr) => {{
        let req = test::TestRequest::post().uri($path).set_json($body).to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_rt::test]
async fn test_health() {
    let ctx = context();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_request_verify_and_reset() {
    let ctx = context();
    let app = app!(ctx);

    let (status, body) = post!(app, "/api/v1/otp/request", json!({"identifier": "+97612345678"}));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cooldown_seconds"], 60);
    let session_id = body["session_id"].as_str().unwrap().to_string();
    let code = ctx.provider.last_code();

    let (status, body) = post!(
        app,
        "/api/v1/otp/verify",
        json!({"session_id": session_id, "code": wrong_code(&code)})
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "CODE_INVALID");
    assert_eq!(body["details"]["attempts_remaining"], 4);

    let (status, body) = post!(app, "/api/v1/otp/verify", json!({"session_id": session_id, "code": "123"}));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CODE_MALFORMED");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/otp/sessions/{}", session_id))
        .to_request();
    let snapshot: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(snapshot["status"], "pending");
    assert_eq!(snapshot["attempts_remaining"], 4);

    let (status, body) = post!(app, "/api/v1/otp/verify", json!({"session_id": session_id, "code": code}));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);

    // Rejected by the credential updater; the reset stays available
    let (status, body) = post!(
        app,
        "/api/v1/password/reset",
        json!({"session_id": session_id, "new_password": "short"})
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, body) = post!(
        app,
        "/api/v1/password/reset",
        json!({"session_id": session_id, "new_password": "n3w-passw0rd"})
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(ctx.credentials.verify("+97612345678", "n3w-passw0rd").await);

    let (status, body) = post!(
        app,
        "/api/v1/password/reset",
        json!({"session_id": session_id, "new_password": "n3w-passw0rd"})
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SESSION_NOT_FOUND");
}

#[actix_rt::test]
async fn test_resend_during_cooldown_sets_retry_after() {
    let ctx = context();
    let app = app!(ctx);

    let (_, body) = post!(app, "/api/v1/otp/request", json!({"identifier": "jane@example.com"}));
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/resend")
        .set_json(json!({"session_id": session_id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = resp
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "COOLDOWN_ACTIVE");
    assert_eq!(body["details"]["retry_after_seconds"], retry_after);
}

#[actix_rt::test]
async fn test_reset_with_link_token() {
    let ctx = context();
    let app = app!(ctx);

    let (_, body) = post!(app, "/api/v1/otp/request", json!({"identifier": "jane@example.com"}));
    let session_id = body["session_id"].as_str().unwrap().to_string();

    // Not verified yet
    let (status, body) = post!(app, "/api/v1/password/reset-token", json!({"session_id": session_id}));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NOT_VERIFIED");

    let code = ctx.provider.last_code();
    post!(app, "/api/v1/otp/verify", json!({"session_id": session_id, "code": code}));

    let (status, body) = post!(app, "/api/v1/password/reset-token", json!({"session_id": session_id}));
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = post!(
        app,
        "/api/v1/password/reset",
        json!({"session_id": session_id, "new_password": "n3w-passw0rd", "reset_token": "forged"})
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "RESET_TOKEN_INVALID");

    let (status, _) = post!(
        app,
        "/api/v1/password/reset",
        json!({"session_id": session_id, "new_password": "n3w-passw0rd", "reset_token": token})
    );
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.credentials.verify("jane@example.com", "n3w-passw0rd").await);
}

#[actix_rt::test]
async fn test_verify_twice_reports_already_consumed() {
    let ctx = context();
    let app = app!(ctx);

    let (_, body) = post!(app, "/api/v1/otp/request", json!({"identifier": "+97612345678"}));
    let session_id = body["session_id"].as_str().unwrap().to_string();
    let code = ctx.provider.last_code();

    let (status, _) = post!(app, "/api/v1/otp/verify", json!({"session_id": session_id, "code": code}));
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post!(app, "/api/v1/otp/verify", json!({"session_id": session_id, "code": code}));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ALREADY_CONSUMED");
}

#[actix_rt::test]
async fn test_bad_input_is_rejected() {
    let ctx = context();
    let app = app!(ctx);

    let (status, body) = post!(app, "/api/v1/otp/request", json!({"identifier": "not-a-phone"}));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IDENTIFIER_INVALID");
    assert!(ctx.provider.messages.lock().unwrap().is_empty());

    let (status, body) = post!(app, "/api/v1/otp/request", json!({"identifier": ""}));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, body) = post!(app, "/api/v1/otp/resend", json!({"session_id": "not-a-uuid"}));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let req = test::TestRequest::get().uri("/api/v1/otp/sessions/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/otp/sessions/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
