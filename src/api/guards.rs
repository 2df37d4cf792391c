use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::time::primitive_now_utc;
use crate::core::{security, state::AppState};
use crate::db::models::Examinee;
use crate::repositories;

/// Authenticated examinee plus the device-token row backing the JWT. The
/// token id travels in the `jti` claim so a revoked row invalidates the
/// bearer token even before it expires.
pub(crate) struct CurrentExaminee {
    pub(crate) examinee: Examinee,
    pub(crate) token_id: String,
}

pub(crate) struct CurrentAdmin(pub(crate) Examinee);

#[async_trait]
impl FromRequestParts<AppState> for CurrentExaminee {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let live = repositories::device_tokens::find_live(
            app_state.db(),
            &claims.jti,
            primitive_now_utc(),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load device token"))?;

        if live.is_none() {
            return Err(ApiError::Unauthorized("Session has been revoked"));
        }

        let examinee = repositories::examinees::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load examinee"))?;

        let Some(examinee) = examinee else {
            return Err(ApiError::Unauthorized("Examinee not found"));
        };

        if !examinee.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentExaminee { examinee, token_id: claims.jti })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentExaminee::from_request_parts(parts, state).await?;

        if current.examinee.is_admin {
            Ok(CurrentAdmin(current.examinee))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}
