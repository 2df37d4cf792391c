use crate::db::models::CourseRule;

pub(crate) const COLUMNS: &str =
    "id, personality_type, min_score, max_score, course_id, passing_rate";

pub(crate) async fn list_by_type(
    executor: impl sqlx::PgExecutor<'_>,
    personality_type: &str,
) -> Result<Vec<CourseRule>, sqlx::Error> {
    sqlx::query_as::<_, CourseRule>(&format!(
        "SELECT {COLUMNS} FROM course_rules WHERE personality_type = $1"
    ))
    .bind(personality_type)
    .fetch_all(executor)
    .await
}
