use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, ExamAttempt, ExamineeRecommendation, PersonalityResult};
use crate::db::types::AttemptRemarks;
use crate::repositories::{answers, attempts, course_rules, exams, personality, questions};
use crate::services::personality::{classify, Choice, PersonalityResponse};
use crate::services::{recommendation, scoring};

const PERSONALITY_PREFIX: &str = "personality_";

#[derive(Debug, thiserror::Error)]
pub(crate) enum AttemptError {
    #[error("Exam not found")]
    ExamNotFound,
    #[error("Question not found")]
    QuestionNotFound,
    #[error("Exam already completed")]
    AlreadyCompleted,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Which monitoring phase a start call opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartPhase {
    Exam,
    Personality,
}

impl StartPhase {
    fn remarks(self) -> AttemptRemarks {
        match self {
            StartPhase::Exam => AttemptRemarks::InProgress,
            StartPhase::Personality => AttemptRemarks::PersonalityTest,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SubmittedAnswer {
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
    pub(crate) time_spent_seconds: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct SingleAnswerInput {
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
    pub(crate) time_spent_seconds: Option<i64>,
    pub(crate) question_started_at: Option<PrimitiveDateTime>,
    pub(crate) question_ended_at: Option<PrimitiveDateTime>,
}

#[derive(Debug)]
pub(crate) struct SingleSaveOutcome {
    pub(crate) is_correct: bool,
    pub(crate) attempt: ExamAttempt,
}

#[derive(Debug)]
pub(crate) struct SubmitOutcome {
    pub(crate) attempt: ExamAttempt,
    pub(crate) score: scoring::ScoreResult,
    pub(crate) passed: bool,
    pub(crate) personality_type: Option<String>,
    pub(crate) recommendations: Vec<ExamineeRecommendation>,
}

/// Splits a mixed submission into exam answers and personality responses.
/// Personality entries carry a reserved question-id prefix; the prefix is
/// stripped to recover the bank id. Malformed personality choices are
/// dropped with a warning rather than failing the submit.
pub(crate) fn partition_submission(
    submitted: &[SubmittedAnswer],
) -> (Vec<SubmittedAnswer>, Vec<PersonalityResponse>) {
    let mut regular = Vec::new();
    let mut responses = Vec::new();

    for answer in submitted {
        match answer.question_id.strip_prefix(PERSONALITY_PREFIX) {
            Some(bank_id) => {
                let choice = answer.selected_answer.as_deref().and_then(Choice::parse);
                match choice {
                    Some(choice) => responses.push(PersonalityResponse {
                        question_id: bank_id.to_string(),
                        choice,
                    }),
                    None => {
                        tracing::warn!(
                            question_id = %answer.question_id,
                            "Dropping personality response without a valid A/B choice"
                        );
                    }
                }
            }
            None => regular.push(answer.clone()),
        }
    }

    (regular, responses)
}

async fn require_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Exam, AttemptError> {
    exams::find_by_id(executor, exam_id).await?.ok_or(AttemptError::ExamNotFound)
}

/// Ensures an attempt row exists under the row lock, creating a fresh
/// in-progress one when absent. Existing rows come back untouched; callers
/// that must reject terminal attempts check `remarks` on the returned row.
async fn ensure_attempt(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    examinee_id: &str,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<ExamAttempt, AttemptError> {
    if let Some(attempt) = attempts::find_for_update(&mut **tx, examinee_id, exam_id).await? {
        return Ok(attempt);
    }

    let id = Uuid::new_v4().to_string();
    let attempt = attempts::create(
        &mut **tx,
        attempts::CreateAttempt {
            id: &id,
            examinee_id,
            exam_id,
            remarks: AttemptRemarks::InProgress,
            started_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    Ok(attempt)
}

/// Starting on a terminal attempt is a read-only no-op returning the stored
/// result; the terminal state only hard-blocks at submit time. Starting on a
/// live attempt moves it to the requested phase and refreshes `started_at`
/// without touching the answer history.
pub(crate) async fn start(
    db: &sqlx::PgPool,
    examinee_id: &str,
    exam_id: &str,
    phase: StartPhase,
) -> Result<ExamAttempt, AttemptError> {
    let now = primitive_now_utc();
    let mut tx = db.begin().await?;

    require_exam(&mut *tx, exam_id).await?;

    let attempt = match attempts::find_for_update(&mut *tx, examinee_id, exam_id).await? {
        None => {
            let id = Uuid::new_v4().to_string();
            attempts::create(
                &mut *tx,
                attempts::CreateAttempt {
                    id: &id,
                    examinee_id,
                    exam_id,
                    remarks: phase.remarks(),
                    started_at: now,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await?
        }
        Some(attempt) if attempt.remarks.is_terminal() => attempt,
        Some(attempt) => {
            attempts::restart(&mut *tx, &attempt.id, phase.remarks(), now, now).await?;
            attempts::find(&mut *tx, examinee_id, exam_id)
                .await?
                .ok_or(AttemptError::ExamNotFound)?
        }
    };

    tx.commit().await?;
    Ok(attempt)
}

/// Real-time single-answer save: upserts the answer and recomputes the
/// attempt summary from the full answer set inside the same transaction,
/// so concurrent saves can never leave the aggregate stale.
pub(crate) async fn save_single_answer(
    db: &sqlx::PgPool,
    examinee_id: &str,
    exam_id: &str,
    input: SingleAnswerInput,
) -> Result<SingleSaveOutcome, AttemptError> {
    let now = primitive_now_utc();
    let mut tx = db.begin().await?;

    require_exam(&mut *tx, exam_id).await?;

    let question = questions::find_by_id(&mut *tx, &input.question_id)
        .await?
        .filter(|question| question.exam_id == exam_id)
        .ok_or(AttemptError::QuestionNotFound)?;

    let attempt = ensure_attempt(&mut tx, examinee_id, exam_id, now).await?;
    if attempt.remarks.is_terminal() {
        return Err(AttemptError::AlreadyCompleted);
    }

    let is_correct = scoring::is_correct_answer(
        input.selected_answer.as_deref(),
        Some(&question.correct_answer),
    );

    let answer_id = Uuid::new_v4().to_string();
    answers::upsert(
        &mut *tx,
        answers::UpsertAnswer {
            id: &answer_id,
            examinee_id,
            exam_id,
            question_id: &input.question_id,
            selected_answer: input.selected_answer.as_deref(),
            is_correct: Some(is_correct),
            time_spent_seconds: input.time_spent_seconds,
            question_started_at: input.question_started_at,
            question_ended_at: input.question_ended_at,
            now,
        },
    )
    .await?;

    let (key, categories) = questions::key_maps_for_exam(&mut *tx, exam_id).await?;
    let stored = answers::list_for_exam(&mut *tx, examinee_id, exam_id).await?;
    let inputs: Vec<scoring::AnswerInput> = stored
        .iter()
        .map(|row| scoring::AnswerInput {
            question_id: row.question_id.clone(),
            selected_answer: row.selected_answer.clone(),
        })
        .collect();
    let result = scoring::score(&inputs, &key, &categories);

    attempts::update_snapshot(
        &mut *tx,
        &attempt.id,
        result.total,
        result.correct,
        &result.by_category,
        now,
    )
    .await?;

    let refreshed = attempts::find(&mut *tx, examinee_id, exam_id)
        .await?
        .ok_or(AttemptError::ExamNotFound)?;
    tx.commit().await?;

    Ok(SingleSaveOutcome { is_correct, attempt: refreshed })
}

/// Final submit: replaces the stored answer set wholesale, scores it,
/// classifies any bundled personality responses, and moves the attempt
/// to its terminal state. A second submit observes the terminal state
/// under the row lock and fails with `AlreadyCompleted`.
pub(crate) async fn submit_bulk(
    db: &sqlx::PgPool,
    examinee_id: &str,
    exam_id: &str,
    submitted: Vec<SubmittedAnswer>,
    time_taken_seconds: Option<i64>,
    default_passing_rate: f64,
) -> Result<SubmitOutcome, AttemptError> {
    let now = primitive_now_utc();
    let mut tx = db.begin().await?;

    let exam = require_exam(&mut *tx, exam_id).await?;
    let attempt = ensure_attempt(&mut tx, examinee_id, exam_id, now).await?;
    if attempt.remarks.is_terminal() {
        return Err(AttemptError::AlreadyCompleted);
    }

    let (regular, responses) = partition_submission(&submitted);

    let (key, categories) = questions::key_maps_for_exam(&mut *tx, exam_id).await?;

    // Retake hygiene: the previous set goes away before the new one lands.
    answers::delete_for_exam(&mut *tx, examinee_id, exam_id).await?;
    let rows: Vec<answers::InsertAnswerRow> = regular
        .iter()
        .map(|answer| answers::InsertAnswerRow {
            id: Uuid::new_v4().to_string(),
            question_id: answer.question_id.clone(),
            selected_answer: answer.selected_answer.clone(),
            is_correct: Some(scoring::is_correct_answer(
                answer.selected_answer.as_deref(),
                key.get(&answer.question_id).map(String::as_str),
            )),
            time_spent_seconds: answer.time_spent_seconds,
        })
        .collect();
    answers::insert_many(&mut *tx, examinee_id, exam_id, &rows, now).await?;

    let inputs: Vec<scoring::AnswerInput> = regular
        .iter()
        .map(|answer| scoring::AnswerInput {
            question_id: answer.question_id.clone(),
            selected_answer: answer.selected_answer.clone(),
        })
        .collect();
    let result = scoring::score(&inputs, &key, &categories);

    let threshold = exam.passing_rate.unwrap_or(default_passing_rate);
    let passed = result.is_passed(threshold);
    let remarks = if passed { AttemptRemarks::Passed } else { AttemptRemarks::Failed };

    let personality_result = if !responses.is_empty() {
        Some(classify_and_store(&mut tx, examinee_id, &responses, now).await?)
    } else {
        None
    };

    let elapsed = time_taken_seconds
        .unwrap_or_else(|| (now - attempt.started_at).whole_seconds().max(0));
    attempts::finalize(
        &mut *tx,
        attempts::FinalizeAttempt {
            id: &attempt.id,
            total_items: result.total,
            correct_count: result.correct,
            category_breakdown: &result.by_category,
            remarks,
            finished_at: now,
            time_taken_seconds: elapsed,
            now,
        },
    )
    .await?;

    let refreshed = attempts::find(&mut *tx, examinee_id, exam_id)
        .await?
        .ok_or(AttemptError::ExamNotFound)?;
    tx.commit().await?;

    // Secondary effect after commit: a recommendation failure degrades to
    // "no recommendation", never to a failed submit.
    let personality_type = personality_result.as_ref().map(PersonalityResult::personality_type);
    let recommendations = if passed {
        resolve_recommendations(
            db,
            examinee_id,
            &refreshed.id,
            personality_result.as_ref(),
            result.percentage,
        )
        .await
    } else {
        Vec::new()
    };

    Ok(SubmitOutcome {
        attempt: refreshed,
        score: result,
        passed,
        personality_type,
        recommendations,
    })
}

async fn classify_and_store(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    examinee_id: &str,
    responses: &[PersonalityResponse],
    now: PrimitiveDateTime,
) -> Result<PersonalityResult, AttemptError> {
    let bank = questions::personality_bank(&mut **tx).await?;

    let rows: Vec<personality::InsertPersonalityAnswer> = responses
        .iter()
        .filter_map(|response| {
            let side = crate::services::personality::chosen_side(response, &bank)?;
            Some(personality::InsertPersonalityAnswer {
                id: Uuid::new_v4().to_string(),
                question_id: response.question_id.clone(),
                selected_answer: response.choice.as_str().to_string(),
                chosen_side: side.to_string(),
            })
        })
        .collect();
    personality::insert_answers(&mut **tx, examinee_id, &rows, now).await?;

    let classification = classify(responses, &bank);
    let result_id = Uuid::new_v4().to_string();
    let result = personality::create_result(
        &mut **tx,
        personality::CreateResult {
            id: &result_id,
            examinee_id,
            ei: &classification.ei.to_string(),
            sn: &classification.sn.to_string(),
            tf: &classification.tf.to_string(),
            jp: &classification.jp.to_string(),
            created_at: now,
        },
    )
    .await?;

    Ok(result)
}

async fn resolve_recommendations(
    db: &sqlx::PgPool,
    examinee_id: &str,
    attempt_id: &str,
    submitted_result: Option<&PersonalityResult>,
    score: f64,
) -> Vec<ExamineeRecommendation> {
    let outcome = async {
        let result = match submitted_result {
            Some(result) => Some(result.clone()),
            None => personality::latest_result(db, examinee_id).await?,
        };
        let Some(result) = result else {
            return Ok(Vec::new());
        };

        let personality_type = result.personality_type();
        let rules = course_rules::list_by_type(db, &personality_type).await?;
        recommendation::resolve_and_persist(
            db,
            examinee_id,
            attempt_id,
            Some(&result.id),
            &rules,
            &personality_type,
            score,
        )
        .await?;

        crate::repositories::recommendations::list_for_attempt(db, attempt_id).await
    }
    .await;

    match outcome {
        Ok(rows) => rows,
        Err(err) => {
            let error: sqlx::Error = err;
            tracing::error!(
                examinee_id,
                attempt_id,
                error = %error,
                "Recommendation resolution failed, returning result without recommendations"
            );
            Vec::new()
        }
    }
}

/// Advisory stop: removes the attempt only while it is still a monitoring
/// placeholder. A concurrent submit wins because the placeholder predicate
/// is re-checked inside the delete itself.
pub(crate) async fn stop(
    db: &sqlx::PgPool,
    examinee_id: &str,
    exam_id: &str,
) -> Result<bool, AttemptError> {
    let mut tx = db.begin().await?;

    let Some(attempt) = attempts::find_for_update(&mut *tx, examinee_id, exam_id).await? else {
        return Ok(false);
    };
    if !attempt.is_monitoring_placeholder() {
        return Ok(false);
    }

    answers::delete_for_exam(&mut *tx, examinee_id, exam_id).await?;
    let deleted = attempts::delete_placeholder(&mut *tx, &attempt.id).await?;
    tx.commit().await?;

    Ok(deleted)
}

pub(crate) async fn snapshot(
    db: &sqlx::PgPool,
    examinee_id: &str,
    exam_id: &str,
) -> Result<Option<ExamAttempt>, AttemptError> {
    Ok(attempts::find(db, examinee_id, exam_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(question_id: &str, selected: Option<&str>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question_id.to_string(),
            selected_answer: selected.map(str::to_string),
            time_spent_seconds: None,
        }
    }

    #[test]
    fn partition_splits_on_the_reserved_prefix() {
        let mixed = vec![
            submitted("q1", Some("A")),
            submitted("personality_p1", Some("B")),
            submitted("q2", None),
        ];
        let (regular, responses) = partition_submission(&mixed);
        assert_eq!(regular.len(), 2);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].question_id, "p1");
        assert_eq!(responses[0].choice, Choice::B);
    }

    #[test]
    fn partition_drops_malformed_personality_choices() {
        let mixed = vec![
            submitted("personality_p1", Some("Z")),
            submitted("personality_p2", None),
            submitted("personality_p3", Some("a")),
        ];
        let (regular, responses) = partition_submission(&mixed);
        assert!(regular.is_empty());
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].question_id, "p3");
        assert_eq!(responses[0].choice, Choice::A);
    }

    #[test]
    fn partition_keeps_unanswered_regular_questions() {
        let (regular, responses) = partition_submission(&[submitted("q1", None)]);
        assert_eq!(regular.len(), 1);
        assert!(responses.is_empty());
    }
}
