use std::collections::HashMap;

use crate::db::models::{PersonalityQuestion, Question};

pub(crate) const COLUMNS: &str = "id, exam_id, category, correct_answer, position";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY position"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

/// Answer key and category lookup for one exam, keyed by question id.
pub(crate) async fn key_maps_for_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<(HashMap<String, String>, HashMap<String, Option<String>>), sqlx::Error> {
    let questions = list_by_exam(executor, exam_id).await?;

    let mut key = HashMap::with_capacity(questions.len());
    let mut categories = HashMap::with_capacity(questions.len());
    for question in questions {
        key.insert(question.id.clone(), question.correct_answer);
        categories.insert(question.id, question.category);
    }

    Ok((key, categories))
}

pub(crate) async fn personality_bank(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<HashMap<String, PersonalityQuestion>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PersonalityQuestion>(
        "SELECT id, positive_side, negative_side FROM personality_questions",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|row| (row.id.clone(), row)).collect())
}
