use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetTokenRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub session_id: Uuid,

    #[validate(length(min = 1, max = 128))]
    pub new_password: String,

    /// Token from a reset link; required when the reset was started by link
    #[validate(length(min = 1, max = 128))]
    pub reset_token: Option<String>,
}
