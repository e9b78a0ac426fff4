//! Error handling for the HTTP surface

pub mod error;

pub use error::{json_error_handler, ApiError};
