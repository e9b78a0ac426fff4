use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use og_api::{configure, telemetry, AppState, OtpService};
use og_core::services::verification::{SessionSweeper, VerificationServiceConfig};
use og_infra::{build_credential_updater, build_delivery_provider, build_session_store};
use og_shared::config::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging)?;

    tracing::info!(
        environment = %config.environment,
        delivery = ?config.delivery.provider,
        store = ?config.store.backend,
        credentials = ?config.credentials.backend,
        "Starting OtpGate API"
    );

    // Collaborators are chosen once here; the service only sees the traits
    let delivery = build_delivery_provider(&config.delivery).context("Failed to build delivery provider")?;
    let store = build_session_store(&config.store)
        .await
        .context("Failed to build session store")?;
    let credentials = build_credential_updater(&config.credentials)
        .await
        .context("Failed to build credential updater")?;

    let service_config = VerificationServiceConfig::from_settings(&config.otp, &config.delivery)
        .with_credential_timeout_ms(config.credentials.update_timeout_ms);
    service_config
        .validate()
        .context("Invalid OTP configuration")?;

    let verification: Arc<OtpService> = Arc::new(OtpService::new(
        delivery,
        store.clone(),
        credentials,
        service_config,
    ));

    let sweeper = Arc::new(SessionSweeper::new(store, config.otp.sweep_interval_seconds));
    let _sweeper_handle = sweeper.start_background_task();

    let app_state = web::Data::new(AppState::new(verification));
    let bind_address = config.server.bind_address();
    let max_payload_size = config.server.max_payload_size;

    tracing::info!(address = %bind_address, "Listening");

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(max_payload_size))
            .wrap(TracingLogger::default())
            .configure(configure)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    Ok(())
}
