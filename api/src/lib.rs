//! # OtpGate API
//!
//! Actix-web surface over the verification service. Handlers translate JSON
//! requests into service calls and map domain outcomes onto HTTP statuses.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod routes;
pub mod telemetry;

pub use app::{configure, AppState, OtpService};
