use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::PersonalityResult;

pub(crate) const RESULT_COLUMNS: &str = "id, examinee_id, ei, sn, tf, jp, created_at";

pub(crate) struct InsertPersonalityAnswer {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) selected_answer: String,
    pub(crate) chosen_side: String,
}

pub(crate) async fn insert_answers(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
    rows: &[InsertPersonalityAnswer],
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO personality_answers \
         (id, examinee_id, question_id, selected_answer, chosen_side, created_at) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.id)
            .push_bind(examinee_id)
            .push_bind(&row.question_id)
            .push_bind(&row.selected_answer)
            .push_bind(&row.chosen_side)
            .push_bind(now);
    });

    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) struct CreateResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) examinee_id: &'a str,
    pub(crate) ei: &'a str,
    pub(crate) sn: &'a str,
    pub(crate) tf: &'a str,
    pub(crate) jp: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create_result(
    executor: impl sqlx::PgExecutor<'_>,
    result: CreateResult<'_>,
) -> Result<PersonalityResult, sqlx::Error> {
    sqlx::query_as::<_, PersonalityResult>(&format!(
        "INSERT INTO personality_results (id, examinee_id, ei, sn, tf, jp, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {RESULT_COLUMNS}"
    ))
    .bind(result.id)
    .bind(result.examinee_id)
    .bind(result.ei)
    .bind(result.sn)
    .bind(result.tf)
    .bind(result.jp)
    .bind(result.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn latest_result(
    executor: impl sqlx::PgExecutor<'_>,
    examinee_id: &str,
) -> Result<Option<PersonalityResult>, sqlx::Error> {
    sqlx::query_as::<_, PersonalityResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM personality_results \
         WHERE examinee_id = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(examinee_id)
    .fetch_optional(executor)
    .await
}
