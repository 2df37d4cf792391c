use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::CourseRule;
use crate::repositories::recommendations::{self, UpsertRecommendation};

/// Rules a score satisfies for a given personality type. A rule matches when
/// the type is equal, the score sits inside the rule's inclusive band, and
/// the score clears the rule's own passing rate (falling back to the band
/// minimum when the rule does not set one).
pub(crate) fn matching_rules<'a>(
    rules: &'a [CourseRule],
    personality_type: &str,
    score: f64,
) -> Vec<&'a CourseRule> {
    rules
        .iter()
        .filter(|rule| rule.personality_type == personality_type)
        .filter(|rule| score >= rule.min_score && score <= rule.max_score)
        .filter(|rule| score >= rule.passing_rate.unwrap_or(rule.min_score))
        .collect()
}

/// Persists one recommendation per matching rule. Duplicate courses for the
/// same attempt are absorbed by the natural key. Returns how many new rows
/// landed.
pub(crate) async fn resolve_and_persist(
    db: &sqlx::PgPool,
    examinee_id: &str,
    attempt_id: &str,
    personality_result_id: Option<&str>,
    rules: &[CourseRule],
    personality_type: &str,
    score: f64,
) -> Result<usize, sqlx::Error> {
    let now = primitive_now_utc();
    let mut inserted = 0;

    for rule in matching_rules(rules, personality_type, score) {
        let id = Uuid::new_v4().to_string();
        let created = recommendations::upsert(
            db,
            UpsertRecommendation {
                id: &id,
                examinee_id,
                attempt_id,
                course_id: &rule.course_id,
                personality_result_id,
                created_at: now,
            },
        )
        .await?;
        if created {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        course_id: &str,
        personality_type: &str,
        min: f64,
        max: f64,
        passing_rate: Option<f64>,
    ) -> CourseRule {
        CourseRule {
            id: format!("rule-{course_id}"),
            personality_type: personality_type.to_string(),
            min_score: min,
            max_score: max,
            course_id: course_id.to_string(),
            passing_rate,
        }
    }

    #[test]
    fn type_must_match_exactly() {
        let rules = vec![rule("c1", "INTJ", 0.0, 100.0, None)];
        assert!(matching_rules(&rules, "ENTJ", 50.0).is_empty());
        assert_eq!(matching_rules(&rules, "INTJ", 50.0).len(), 1);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let rules = vec![rule("c1", "INTJ", 40.0, 60.0, None)];
        assert_eq!(matching_rules(&rules, "INTJ", 40.0).len(), 1);
        assert_eq!(matching_rules(&rules, "INTJ", 60.0).len(), 1);
        assert!(matching_rules(&rules, "INTJ", 39.9).is_empty());
        assert!(matching_rules(&rules, "INTJ", 60.1).is_empty());
    }

    #[test]
    fn explicit_passing_rate_tightens_the_band() {
        let rules = vec![rule("c1", "INTJ", 40.0, 90.0, Some(70.0))];
        assert!(matching_rules(&rules, "INTJ", 65.0).is_empty());
        assert_eq!(matching_rules(&rules, "INTJ", 70.0).len(), 1);
    }

    #[test]
    fn missing_passing_rate_falls_back_to_band_minimum() {
        let rules = vec![rule("c1", "INTJ", 40.0, 90.0, None)];
        assert_eq!(matching_rules(&rules, "INTJ", 40.0).len(), 1);
    }

    #[test]
    fn multiple_rules_can_match_one_score() {
        let rules = vec![
            rule("c1", "INTJ", 0.0, 100.0, None),
            rule("c2", "INTJ", 50.0, 100.0, None),
            rule("c3", "ENFP", 0.0, 100.0, None),
        ];
        let matched = matching_rules(&rules, "INTJ", 75.0);
        let ids: Vec<&str> = matched.iter().map(|rule| rule.course_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
