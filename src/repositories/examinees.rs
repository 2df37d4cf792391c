use time::PrimitiveDateTime;

use crate::db::models::Examinee;

pub(crate) const COLUMNS: &str = "\
    id, username, hashed_password, full_name, is_admin, is_active, created_at, updated_at";

pub(crate) struct CreateExaminee<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) full_name: &'a str,
    pub(crate) is_admin: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Examinee>, sqlx::Error> {
    sqlx::query_as::<_, Examinee>(&format!("SELECT {COLUMNS} FROM examinees WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_username(
    executor: impl sqlx::PgExecutor<'_>,
    username: &str,
) -> Result<Option<Examinee>, sqlx::Error> {
    sqlx::query_as::<_, Examinee>(&format!("SELECT {COLUMNS} FROM examinees WHERE username = $1"))
        .bind(username)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    examinee: CreateExaminee<'_>,
) -> Result<Examinee, sqlx::Error> {
    sqlx::query_as::<_, Examinee>(&format!(
        "INSERT INTO examinees (
            id, username, hashed_password, full_name, is_admin, is_active,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(examinee.id)
    .bind(examinee.username)
    .bind(&examinee.hashed_password)
    .bind(examinee.full_name)
    .bind(examinee.is_admin)
    .bind(examinee.is_active)
    .bind(examinee.created_at)
    .bind(examinee.updated_at)
    .fetch_one(executor)
    .await
}
