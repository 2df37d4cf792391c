use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{AttemptRemarks, ExamKind};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Examinee {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_admin: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) title: String,
    pub(crate) kind: ExamKind,
    pub(crate) time_limit_minutes: i32,
    pub(crate) passing_rate: Option<f64>,
    pub(crate) includes_personality: bool,
    pub(crate) scheduled_on: Option<Date>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) category: Option<String>,
    pub(crate) correct_answer: String,
    pub(crate) position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PersonalityQuestion {
    pub(crate) id: String,
    pub(crate) positive_side: String,
    pub(crate) negative_side: String,
}

/// One entry of the persisted per-category breakdown, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CategoryScore {
    pub(crate) category: String,
    pub(crate) correct: i32,
    pub(crate) total: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAttempt {
    pub(crate) id: String,
    pub(crate) examinee_id: String,
    pub(crate) exam_id: String,
    pub(crate) total_items: i32,
    pub(crate) correct_count: i32,
    pub(crate) category_breakdown: Json<Vec<CategoryScore>>,
    pub(crate) remarks: AttemptRemarks,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) finished_at: Option<PrimitiveDateTime>,
    pub(crate) time_taken_seconds: Option<i64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl ExamAttempt {
    /// An attempt created only to mark "monitoring started": never finished
    /// and no answers recorded. Safe to delete on an explicit stop.
    pub(crate) fn is_monitoring_placeholder(&self) -> bool {
        self.finished_at.is_none() && self.total_items == 0 && self.correct_count == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) examinee_id: String,
    pub(crate) exam_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) time_spent_seconds: Option<i64>,
    pub(crate) question_started_at: Option<PrimitiveDateTime>,
    pub(crate) question_ended_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PersonalityResult {
    pub(crate) id: String,
    pub(crate) examinee_id: String,
    pub(crate) ei: String,
    pub(crate) sn: String,
    pub(crate) tf: String,
    pub(crate) jp: String,
    pub(crate) created_at: PrimitiveDateTime,
}

impl PersonalityResult {
    /// Derived on read; the concatenated type is never stored.
    pub(crate) fn personality_type(&self) -> String {
        format!("{}{}{}{}", self.ei, self.sn, self.tf, self.jp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseRule {
    pub(crate) id: String,
    pub(crate) personality_type: String,
    pub(crate) min_score: f64,
    pub(crate) max_score: f64,
    pub(crate) course_id: String,
    pub(crate) passing_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamineeRecommendation {
    pub(crate) id: String,
    pub(crate) examinee_id: String,
    pub(crate) attempt_id: String,
    pub(crate) course_id: String,
    pub(crate) personality_result_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct DeviceToken {
    pub(crate) id: String,
    pub(crate) examinee_id: String,
    pub(crate) device_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    pub(crate) revoked: bool,
}
