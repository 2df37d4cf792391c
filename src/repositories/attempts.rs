use sqlx::types::Json;
use time::PrimitiveDateTime;

use crate::db::models::{CategoryScore, ExamAttempt};
use crate::db::types::AttemptRemarks;

pub(crate) const COLUMNS: &str = "\
    id, examinee_id, exam_id, total_items, correct_count, category_breakdown, remarks, \
    started_at, finished_at, time_taken_seconds, created_at, updated_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) examinee_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) remarks: AttemptRemarks,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    exam_id: &str,
) -> Result<Option<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {COLUMNS} FROM exam_attempts WHERE examinee_id = $1 AND exam_id = $2"
    ))
    .bind(examinee_id)
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

/// Row-locked read; concurrent submits for the same attempt serialize here.
pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    exam_id: &str,
) -> Result<Option<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {COLUMNS} FROM exam_attempts WHERE examinee_id = $1 AND exam_id = $2 FOR UPDATE"
    ))
    .bind(examinee_id)
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: CreateAttempt<'_>,
) -> Result<ExamAttempt, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "INSERT INTO exam_attempts (
            id, examinee_id, exam_id, total_items, correct_count, category_breakdown,
            remarks, started_at, created_at, updated_at
        ) VALUES ($1,$2,$3,0,0,'[]'::jsonb,$4,$5,$6,$7)
        RETURNING {COLUMNS}"
    ))
    .bind(attempt.id)
    .bind(attempt.examinee_id)
    .bind(attempt.exam_id)
    .bind(attempt.remarks)
    .bind(attempt.started_at)
    .bind(attempt.created_at)
    .bind(attempt.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn restart(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    remarks: AttemptRemarks,
    started_at: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_attempts SET remarks = $1, started_at = $2, finished_at = NULL, \
         time_taken_seconds = NULL, updated_at = $3 WHERE id = $4",
    )
    .bind(remarks)
    .bind(started_at)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn update_snapshot(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    total_items: i32,
    correct_count: i32,
    category_breakdown: &[CategoryScore],
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_attempts SET total_items = $1, correct_count = $2, \
         category_breakdown = $3, updated_at = $4 WHERE id = $5",
    )
    .bind(total_items)
    .bind(correct_count)
    .bind(Json(category_breakdown))
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct FinalizeAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) total_items: i32,
    pub(crate) correct_count: i32,
    pub(crate) category_breakdown: &'a [CategoryScore],
    pub(crate) remarks: AttemptRemarks,
    pub(crate) finished_at: PrimitiveDateTime,
    pub(crate) time_taken_seconds: i64,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: FinalizeAttempt<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_attempts SET total_items = $1, correct_count = $2, \
         category_breakdown = $3, remarks = $4, finished_at = $5, \
         time_taken_seconds = $6, updated_at = $7 WHERE id = $8",
    )
    .bind(attempt.total_items)
    .bind(attempt.correct_count)
    .bind(Json(attempt.category_breakdown))
    .bind(attempt.remarks)
    .bind(attempt.finished_at)
    .bind(attempt.time_taken_seconds)
    .bind(attempt.now)
    .bind(attempt.id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Deletes only when the placeholder predicate still holds; the predicate is
/// part of the statement so a concurrent submit cannot lose a finished attempt.
pub(crate) async fn delete_placeholder(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM exam_attempts WHERE id = $1 AND finished_at IS NULL \
         AND total_items = 0 AND correct_count = 0",
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn any_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM exam_attempts WHERE examinee_id = $1 \
         AND remarks = $2 AND finished_at IS NULL",
    )
    .bind(examinee_id)
    .bind(AttemptRemarks::InProgress)
    .fetch_one(executor)
    .await?;

    Ok(count > 0)
}
