use time::PrimitiveDateTime;

use crate::db::models::ExamineeRecommendation;

pub(crate) const COLUMNS: &str = "\
    id, examinee_id, attempt_id, course_id, personality_result_id, created_at";

pub(crate) struct UpsertRecommendation<'a> {
    pub(crate) id: &'a str,
    pub(crate) examinee_id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) personality_result_id: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Idempotent under retry: the (examinee, attempt, course) key absorbs
/// duplicate writes.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    recommendation: UpsertRecommendation<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO examinee_recommendations (
            id, examinee_id, attempt_id, course_id, personality_result_id, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6)
        ON CONFLICT (examinee_id, attempt_id, course_id) DO NOTHING",
    )
    .bind(recommendation.id)
    .bind(recommendation.examinee_id)
    .bind(recommendation.attempt_id)
    .bind(recommendation.course_id)
    .bind(recommendation.personality_result_id)
    .bind(recommendation.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_for_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<Vec<ExamineeRecommendation>, sqlx::Error> {
    sqlx::query_as::<_, ExamineeRecommendation>(&format!(
        "SELECT {COLUMNS} FROM examinee_recommendations WHERE attempt_id = $1 ORDER BY course_id"
    ))
    .bind(attempt_id)
    .fetch_all(executor)
    .await
}
