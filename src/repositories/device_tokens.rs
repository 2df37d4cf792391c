use time::PrimitiveDateTime;

use crate::db::models::DeviceToken;

pub(crate) const COLUMNS: &str = "id, examinee_id, device_id, created_at, expires_at, revoked";

pub(crate) struct CreateToken<'a> {
    pub(crate) id: &'a str,
    pub(crate) examinee_id: &'a str,
    pub(crate) device_id: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
}

pub(crate) async fn find_live(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<DeviceToken>, sqlx::Error> {
    sqlx::query_as::<_, DeviceToken>(&format!(
        "SELECT {COLUMNS} FROM device_tokens \
         WHERE id = $1 AND NOT revoked AND (expires_at IS NULL OR expires_at > $2)"
    ))
    .bind(id)
    .bind(now)
    .fetch_optional(executor)
    .await
}

/// Active tokens for one account, row-locked so concurrent logins serialize
/// over the whole read-revoke-issue sequence.
pub(crate) async fn list_active_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    now: PrimitiveDateTime,
) -> Result<Vec<DeviceToken>, sqlx::Error> {
    sqlx::query_as::<_, DeviceToken>(&format!(
        "SELECT {COLUMNS} FROM device_tokens \
         WHERE examinee_id = $1 AND NOT revoked \
           AND (expires_at IS NULL OR expires_at > $2) \
         ORDER BY created_at FOR UPDATE"
    ))
    .bind(examinee_id)
    .bind(now)
    .fetch_all(executor)
    .await
}

pub(crate) async fn revoke_ids(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("UPDATE device_tokens SET revoked = TRUE WHERE id = ANY($1)")
        .bind(ids)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn revoke_all_except(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    spared_token_id: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = match spared_token_id {
        Some(spared) => {
            sqlx::query(
                "UPDATE device_tokens SET revoked = TRUE \
                 WHERE examinee_id = $1 AND NOT revoked AND id <> $2",
            )
            .bind(examinee_id)
            .bind(spared)
            .execute(executor)
            .await?
        }
        None => {
            sqlx::query("UPDATE device_tokens SET revoked = TRUE WHERE examinee_id = $1 AND NOT revoked")
                .bind(examinee_id)
                .execute(executor)
                .await?
        }
    };

    Ok(result.rows_affected())
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    token: CreateToken<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO device_tokens (id, examinee_id, device_id, created_at, expires_at, revoked)
         VALUES ($1,$2,$3,$4,$5,FALSE)",
    )
    .bind(token.id)
    .bind(token.examinee_id)
    .bind(token.device_id)
    .bind(token.created_at)
    .bind(token.expires_at)
    .execute(executor)
    .await?;
    Ok(())
}
