use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestCodeRequest {
    /// Phone number in international form or an email address
    /// Examples: "+97612345678", "jane@example.com"
    #[validate(length(min = 3, max = 254))]
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendCodeRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    pub session_id: Uuid,

    /// Code as received; its exact length is checked by the service
    #[validate(length(min = 1, max = 32))]
    pub code: String,
}
