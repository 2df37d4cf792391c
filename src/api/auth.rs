use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentExaminee;
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::Examinee;
use crate::repositories;
use crate::schemas::auth::{
    ExamineeResponse, ForceLogoutRequest, ForceLogoutResponse, LoginRequest, TokenResponse,
};
use crate::services::device_guard::{self, GuardPolicy};

/// Max attempts per window for auth endpoints.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/force-logout", post(force_logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let rate_key = format!("rl:login:{}", payload.username);
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let examinee = fetch_examinee(&state, &payload.username).await?;

    let verified = security::verify_password(&payload.password, &examinee.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !examinee.is_active {
        return Err(ApiError::BadRequest("Inactive examinee".to_string()));
    }

    let exam_settings = state.settings().exam();
    let policy =
        GuardPolicy::new(exam_settings.token_max_age_days, exam_settings.device_grace_minutes);
    let token_id =
        device_guard::authorize(state.db(), &examinee.id, payload.device_id.as_deref(), policy)
            .await?;

    let token = security::create_access_token(&examinee.id, &token_id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        examinee: ExamineeResponse::from_db(examinee),
    }))
}

/// Explicit escape hatch when the device guard blocks a legitimate device
/// change. The password is re-verified before anything is revoked.
async fn force_logout(
    State(state): State<AppState>,
    current: CurrentExaminee,
    Json(payload): Json<ForceLogoutRequest>,
) -> Result<Json<ForceLogoutResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let verified =
        security::verify_password(&payload.password, &current.examinee.hashed_password)
            .map_err(|_| ApiError::Unauthorized("Incorrect password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect password"));
    }

    let spared = payload.keep_current_device.then_some(current.token_id.as_str());
    let revoked_count = device_guard::force_logout(state.db(), &current.examinee.id, spared)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to revoke device tokens"))?;

    tracing::info!(
        examinee_id = %current.examinee.id,
        revoked_count,
        "Forced logout of other devices"
    );

    Ok(Json(ForceLogoutResponse { revoked_count }))
}

async fn me(current: CurrentExaminee) -> Json<ExamineeResponse> {
    Json(ExamineeResponse::from_db(current.examinee))
}

async fn fetch_examinee(state: &AppState, username: &str) -> Result<Examinee, ApiError> {
    repositories::examinees::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load examinee"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))
}
