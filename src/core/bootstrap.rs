use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::examinees;

/// Creates (or repairs) the default admin account at startup so the
/// schedule-override endpoint is reachable on a fresh deployment.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let username = &admin.first_admin_username;
    let now = primitive_now_utc();

    if let Some(existing) = examinees::find_by_username(state.db(), username).await? {
        let verified =
            security::verify_password(&admin.first_admin_password, &existing.hashed_password)
                .unwrap_or(false);

        if verified && existing.is_admin && existing.is_active {
            tracing::info!("Default admin already up to date");
            return Ok(());
        }

        let hashed_password = if verified {
            existing.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_admin_password)?
        };

        sqlx::query(
            "UPDATE examinees
             SET hashed_password = $1, is_admin = TRUE, is_active = TRUE, updated_at = $2
             WHERE id = $3",
        )
        .bind(hashed_password)
        .bind(now)
        .bind(&existing.id)
        .execute(state.db())
        .await?;

        tracing::info!("Updated default admin {username}");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;

    examinees::create(
        state.db(),
        examinees::CreateExaminee {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name: "Administrator",
            is_admin: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created default admin {username}");
    Ok(())
}
