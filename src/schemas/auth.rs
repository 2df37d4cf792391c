use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Examinee;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub(crate) username: String,
    #[validate(length(min = 1, max = 256))]
    pub(crate) password: String,
    #[serde(default)]
    #[serde(alias = "deviceId")]
    pub(crate) device_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ForceLogoutRequest {
    /// Re-verified before any revocation happens.
    #[validate(length(min = 1, max = 256))]
    pub(crate) password: String,
    #[serde(default)]
    #[serde(alias = "keepCurrentDevice")]
    pub(crate) keep_current_device: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) examinee: ExamineeResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct ForceLogoutResponse {
    pub(crate) revoked_count: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamineeResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) is_admin: bool,
    pub(crate) created_at: String,
}

impl ExamineeResponse {
    pub(crate) fn from_db(examinee: Examinee) -> Self {
        Self {
            id: examinee.id,
            username: examinee.username,
            full_name: examinee.full_name,
            is_admin: examinee.is_admin,
            created_at: format_primitive(examinee.created_at),
        }
    }
}
