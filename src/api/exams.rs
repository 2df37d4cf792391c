use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentExaminee};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::ExamKind;
use crate::repositories::exams;
use crate::schemas::attempt::{
    AttemptResponse, BulkSubmitRequest, SingleAnswerRequest, SingleSaveResponse, StartRequest,
    StopResponse, SubmitResponse,
};
use crate::schemas::exam::{ExamResponse, ScheduleOverrideResponse};
use crate::services::attempt_flow::{self, SingleAnswerInput, StartPhase};
use crate::services::{exam_codes, schedule_override};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/code/:code", get(exam_by_code))
        .route("/:exam_id/start", post(start_attempt))
        .route("/:exam_id/answers", post(save_answer))
        .route("/:exam_id/submit", post(submit))
        .route("/:exam_id/stop", post(stop_attempt))
        .route("/:exam_id/attempt", get(attempt_snapshot))
}

/// Code lookup resolves scrambled schedule codes; schedule exams are then
/// gated to their scheduled day unless a staff override is armed.
async fn exam_by_code(
    State(state): State<AppState>,
    _current: CurrentExaminee,
    Path(code): Path<String>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = exam_codes::find_by_code(state.db(), &code).await?;

    if exam.kind == ExamKind::Schedule {
        let today = primitive_now_utc().date();
        let policy = schedule_override::current(state.redis(), today).await;
        if !policy.allows(exam.scheduled_on, today) {
            return Err(ApiError::Forbidden("Exam is not scheduled for today"));
        }
    }

    let total_questions = exams::count_questions(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exam questions"))?;

    Ok(Json(ExamResponse::from_db(exam, total_questions)))
}

async fn start_attempt(
    State(state): State<AppState>,
    current: CurrentExaminee,
    Path(exam_id): Path<String>,
    payload: Option<Json<StartRequest>>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let phase = payload
        .and_then(|Json(body)| body.phase)
        .map(|phase| phase.into_phase())
        .unwrap_or(StartPhase::Exam);

    let attempt = attempt_flow::start(state.db(), &current.examinee.id, &exam_id, phase).await?;
    Ok(Json(AttemptResponse::from_db(attempt)))
}

async fn save_answer(
    State(state): State<AppState>,
    current: CurrentExaminee,
    Path(exam_id): Path<String>,
    Json(payload): Json<SingleAnswerRequest>,
) -> Result<Json<SingleSaveResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let input = SingleAnswerInput {
        question_id: payload.question_id,
        selected_answer: payload.selected_answer,
        time_spent_seconds: payload.time_spent_seconds,
        question_started_at: parse_timestamp(payload.question_started_at.as_deref())?,
        question_ended_at: parse_timestamp(payload.question_ended_at.as_deref())?,
    };

    let outcome =
        attempt_flow::save_single_answer(state.db(), &current.examinee.id, &exam_id, input)
            .await?;

    Ok(Json(SingleSaveResponse::from_outcome(outcome)))
}

async fn submit(
    State(state): State<AppState>,
    current: CurrentExaminee,
    Path(exam_id): Path<String>,
    Json(payload): Json<BulkSubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submitted =
        payload.answers.into_iter().map(|item| item.into_submitted()).collect::<Vec<_>>();

    let outcome = attempt_flow::submit_bulk(
        state.db(),
        &current.examinee.id,
        &exam_id,
        submitted,
        payload.time_taken_seconds,
        state.settings().exam().default_passing_rate,
    )
    .await?;

    Ok(Json(SubmitResponse::from_outcome(outcome)))
}

async fn stop_attempt(
    State(state): State<AppState>,
    current: CurrentExaminee,
    Path(exam_id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let deleted = attempt_flow::stop(state.db(), &current.examinee.id, &exam_id).await?;
    Ok(Json(StopResponse { deleted }))
}

async fn attempt_snapshot(
    State(state): State<AppState>,
    current: CurrentExaminee,
    Path(exam_id): Path<String>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let attempt = attempt_flow::snapshot(state.db(), &current.examinee.id, &exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No attempt for this exam".to_string()))?;

    Ok(Json(AttemptResponse::from_db(attempt)))
}

/// Arms today's schedule override; the redis TTL scopes it to roughly a day.
pub(crate) async fn arm_schedule_override(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<ScheduleOverrideResponse>, ApiError> {
    let today = primitive_now_utc().date();
    let ttl_seconds = state.settings().exam().schedule_override_ttl_seconds;

    schedule_override::arm(state.redis(), today, ttl_seconds)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to arm schedule override"))?;

    tracing::info!(admin_id = %admin.id, day = %today, "Schedule override armed");

    Ok(Json(ScheduleOverrideResponse { armed: true, day: today.to_string(), ttl_seconds }))
}

fn parse_timestamp(raw: Option<&str>) -> Result<Option<time::PrimitiveDateTime>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let parsed = OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|_| ApiError::BadRequest(format!("Invalid timestamp: {raw}")))?
        .to_offset(time::UtcOffset::UTC);

    Ok(Some(time::PrimitiveDateTime::new(parsed.date(), parsed.time())))
}
