use std::collections::HashMap;

use crate::db::models::CategoryScore;

/// Bucket for questions whose id is missing from the answer key.
pub(crate) const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone)]
pub(crate) struct AnswerInput {
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreResult {
    pub(crate) correct: i32,
    pub(crate) total: i32,
    pub(crate) by_category: Vec<CategoryScore>,
    pub(crate) percentage: f64,
}

impl ScoreResult {
    pub(crate) fn is_passed(&self, threshold: f64) -> bool {
        self.percentage >= threshold
    }
}

pub(crate) fn is_correct_answer(selected: Option<&str>, key_letter: Option<&str>) -> bool {
    match (selected, key_letter) {
        (Some(selected), Some(key)) => selected == key,
        _ => false,
    }
}

/// Pure function of (answers, key, categories). Unknown question ids count
/// toward the total but never toward correct, and land in the
/// "Uncategorized" bucket. Category order is first-seen, not alphabetical.
pub(crate) fn score(
    answers: &[AnswerInput],
    key: &HashMap<String, String>,
    categories: &HashMap<String, Option<String>>,
) -> ScoreResult {
    let mut correct = 0;
    let mut by_category: Vec<CategoryScore> = Vec::new();

    for answer in answers {
        let key_letter = key.get(&answer.question_id).map(String::as_str);
        let is_correct = is_correct_answer(answer.selected_answer.as_deref(), key_letter);

        let category = categories
            .get(&answer.question_id)
            .and_then(|category| category.as_deref())
            .filter(|_| key_letter.is_some())
            .unwrap_or(UNCATEGORIZED);

        let entry = match by_category.iter_mut().find(|entry| entry.category == category) {
            Some(entry) => entry,
            None => {
                by_category.push(CategoryScore {
                    category: category.to_string(),
                    correct: 0,
                    total: 0,
                });
                by_category.last_mut().expect("just pushed")
            }
        };

        entry.total += 1;
        if is_correct {
            entry.correct += 1;
            correct += 1;
        }
    }

    let total = answers.len() as i32;
    let percentage = if total > 0 { 100.0 * f64::from(correct) / f64::from(total) } else { 0.0 };

    ScoreResult { correct, total, by_category, percentage }
}
