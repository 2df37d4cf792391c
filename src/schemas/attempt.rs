use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{CategoryScore, ExamAttempt, ExamineeRecommendation};
use crate::db::types::AttemptRemarks;
use crate::services::attempt_flow::{SingleSaveOutcome, SubmitOutcome, SubmittedAnswer};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StartPhaseRequest {
    Exam,
    Personality,
}

impl StartPhaseRequest {
    pub(crate) fn into_phase(self) -> crate::services::attempt_flow::StartPhase {
        match self {
            StartPhaseRequest::Exam => crate::services::attempt_flow::StartPhase::Exam,
            StartPhaseRequest::Personality => {
                crate::services::attempt_flow::StartPhase::Personality
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartRequest {
    #[serde(default)]
    pub(crate) phase: Option<StartPhaseRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SingleAnswerRequest {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, max = 64))]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "selectedAnswer")]
    #[validate(length(max = 8))]
    pub(crate) selected_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeSpentSeconds")]
    pub(crate) time_spent_seconds: Option<i64>,
    #[serde(default)]
    #[serde(alias = "questionStartedAt")]
    pub(crate) question_started_at: Option<String>,
    #[serde(default)]
    #[serde(alias = "questionEndedAt")]
    pub(crate) question_ended_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BulkAnswerItem {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "selectedAnswer")]
    pub(crate) selected_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeSpentSeconds")]
    pub(crate) time_spent_seconds: Option<i64>,
}

impl BulkAnswerItem {
    pub(crate) fn into_submitted(self) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: self.question_id,
            selected_answer: self.selected_answer,
            time_spent_seconds: self.time_spent_seconds,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkSubmitRequest {
    #[validate(length(min = 1))]
    pub(crate) answers: Vec<BulkAnswerItem>,
    #[serde(default)]
    #[serde(alias = "timeTakenSeconds")]
    pub(crate) time_taken_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) total_items: i32,
    pub(crate) correct_count: i32,
    pub(crate) category_breakdown: Vec<CategoryScore>,
    pub(crate) remarks: AttemptRemarks,
    pub(crate) started_at: String,
    pub(crate) finished_at: Option<String>,
    pub(crate) time_taken_seconds: Option<i64>,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: ExamAttempt) -> Self {
        Self {
            id: attempt.id,
            exam_id: attempt.exam_id,
            total_items: attempt.total_items,
            correct_count: attempt.correct_count,
            category_breakdown: attempt.category_breakdown.0,
            remarks: attempt.remarks,
            started_at: format_primitive(attempt.started_at),
            finished_at: attempt.finished_at.map(format_primitive),
            time_taken_seconds: attempt.time_taken_seconds,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SingleSaveResponse {
    pub(crate) is_correct: bool,
    pub(crate) running_correct: i32,
    pub(crate) running_total: i32,
    pub(crate) category_breakdown: Vec<CategoryScore>,
}

impl SingleSaveResponse {
    pub(crate) fn from_outcome(outcome: SingleSaveOutcome) -> Self {
        Self {
            is_correct: outcome.is_correct,
            running_correct: outcome.attempt.correct_count,
            running_total: outcome.attempt.total_items,
            category_breakdown: outcome.attempt.category_breakdown.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RecommendationResponse {
    pub(crate) course_id: String,
    pub(crate) created_at: String,
}

impl RecommendationResponse {
    pub(crate) fn from_db(row: ExamineeRecommendation) -> Self {
        Self { course_id: row.course_id, created_at: format_primitive(row.created_at) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) score: f64,
    pub(crate) correct: i32,
    pub(crate) total: i32,
    pub(crate) passed: bool,
    pub(crate) remarks: AttemptRemarks,
    pub(crate) category_breakdown: Vec<CategoryScore>,
    pub(crate) personality_type: Option<String>,
    pub(crate) recommendations: Vec<RecommendationResponse>,
}

impl SubmitResponse {
    pub(crate) fn from_outcome(outcome: SubmitOutcome) -> Self {
        Self {
            score: outcome.score.percentage,
            correct: outcome.score.correct,
            total: outcome.score.total,
            passed: outcome.passed,
            remarks: outcome.attempt.remarks,
            category_breakdown: outcome.score.by_category,
            personality_type: outcome.personality_type,
            recommendations: outcome
                .recommendations
                .into_iter()
                .map(RecommendationResponse::from_db)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StopResponse {
    pub(crate) deleted: bool,
}
