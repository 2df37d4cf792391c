use crate::api::errors::ApiError;
use crate::db::models::Exam;
use crate::db::types::ExamKind;
use crate::repositories::exams;

/// Canonical form for comparing exam codes: keep alphanumerics, uppercase,
/// sort. "ABC-123" and "3c1 ba2" collapse to the same key.
pub(crate) fn normalize(code: &str) -> String {
    let mut letters: Vec<char> = code
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    letters.sort_unstable();
    letters.into_iter().collect()
}

/// Looks an exam up by its code. Exact match first, then a normalized match
/// over schedule exams so scrambled schedule codes still resolve.
pub(crate) async fn find_by_code(db: &sqlx::PgPool, code: &str) -> Result<Exam, ApiError> {
    let exact = exams::find_by_code(db, code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up exam by code"))?;
    if let Some(exam) = exact {
        return Ok(exam);
    }

    let wanted = normalize(code);
    if !wanted.is_empty() {
        let schedule_exams = exams::list_by_kind(db, ExamKind::Schedule)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list schedule exams"))?;
        if let Some(exam) = schedule_exams.into_iter().find(|exam| normalize(&exam.code) == wanted)
        {
            return Ok(exam);
        }
    }

    Err(ApiError::NotFound("Exam not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sorts_and_strips_punctuation() {
        assert_eq!(normalize("ABC-123"), "123ABC");
        assert_eq!(normalize("3C1-BA2"), "123ABC");
        assert_eq!(normalize("abc 123"), "123ABC");
    }

    #[test]
    fn normalize_distinguishes_different_multisets() {
        assert_ne!(normalize("ABC-123"), normalize("ABD-123"));
        assert_ne!(normalize("AABC"), normalize("ABC"));
    }

    #[test]
    fn normalize_empty_input() {
        assert_eq!(normalize("---"), "");
        assert_eq!(normalize(""), "");
    }
}
