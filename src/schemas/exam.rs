use serde::Serialize;

use crate::db::models::Exam;
use crate::db::types::ExamKind;

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) exam_id: String,
    pub(crate) code: String,
    pub(crate) title: String,
    pub(crate) kind: ExamKind,
    pub(crate) time_limit_minutes: i32,
    pub(crate) total_questions: i64,
    pub(crate) includes_personality: bool,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam, total_questions: i64) -> Self {
        Self {
            exam_id: exam.id,
            code: exam.code,
            title: exam.title,
            kind: exam.kind,
            time_limit_minutes: exam.time_limit_minutes,
            total_questions,
            includes_personality: exam.includes_personality,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ScheduleOverrideResponse {
    pub(crate) armed: bool,
    pub(crate) day: String,
    pub(crate) ttl_seconds: u64,
}
