use crate::db::models::Exam;
use crate::db::types::ExamKind;

pub(crate) const COLUMNS: &str = "\
    id, code, title, kind, time_limit_minutes, passing_rate, includes_personality, \
    scheduled_on, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_code(
    executor: impl sqlx::PgExecutor<'_>,
    code: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE code = $1"))
        .bind(code)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_by_kind(
    executor: impl sqlx::PgExecutor<'_>,
    kind: ExamKind,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE kind = $1"))
        .bind(kind)
        .fetch_all(executor)
        .await
}

pub(crate) async fn count_questions(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(executor)
        .await
}
