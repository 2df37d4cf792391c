use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Answer;

pub(crate) const COLUMNS: &str = "\
    id, examinee_id, exam_id, question_id, selected_answer, is_correct, \
    time_spent_seconds, question_started_at, question_ended_at, created_at, updated_at";

pub(crate) struct UpsertAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) examinee_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_answer: Option<&'a str>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) time_spent_seconds: Option<i64>,
    pub(crate) question_started_at: Option<PrimitiveDateTime>,
    pub(crate) question_ended_at: Option<PrimitiveDateTime>,
    pub(crate) now: PrimitiveDateTime,
}

/// Last write wins per (examinee, exam, question); the natural key carries
/// idempotency for client retries.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    answer: UpsertAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO answers (
            id, examinee_id, exam_id, question_id, selected_answer, is_correct,
            time_spent_seconds, question_started_at, question_ended_at, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        ON CONFLICT (examinee_id, exam_id, question_id) DO UPDATE SET
            selected_answer = EXCLUDED.selected_answer,
            is_correct = EXCLUDED.is_correct,
            time_spent_seconds = EXCLUDED.time_spent_seconds,
            question_started_at = EXCLUDED.question_started_at,
            question_ended_at = EXCLUDED.question_ended_at,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(answer.id)
    .bind(answer.examinee_id)
    .bind(answer.exam_id)
    .bind(answer.question_id)
    .bind(answer.selected_answer)
    .bind(answer.is_correct)
    .bind(answer.time_spent_seconds)
    .bind(answer.question_started_at)
    .bind(answer.question_ended_at)
    .bind(answer.now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_exam(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    exam_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers \
         WHERE examinee_id = $1 AND exam_id = $2 ORDER BY created_at, question_id"
    ))
    .bind(examinee_id)
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

/// Retake hygiene: the prior set is removed wholesale before the new one lands.
pub(crate) async fn delete_for_exam(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    exam_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM answers WHERE examinee_id = $1 AND exam_id = $2")
        .bind(examinee_id)
        .bind(exam_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) struct InsertAnswerRow {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) time_spent_seconds: Option<i64>,
}

pub(crate) async fn insert_many(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    exam_id: &str,
    rows: &[InsertAnswerRow],
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO answers (id, examinee_id, exam_id, question_id, selected_answer, \
         is_correct, time_spent_seconds, created_at, updated_at) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.id)
            .push_bind(examinee_id)
            .push_bind(exam_id)
            .push_bind(&row.question_id)
            .push_bind(&row.selected_answer)
            .push_bind(row.is_correct)
            .push_bind(row.time_spent_seconds)
            .push_bind(now)
            .push_bind(now);
    });

    builder.build().execute(executor).await?;
    Ok(())
}
