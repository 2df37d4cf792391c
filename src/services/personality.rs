use std::collections::HashMap;

use crate::db::models::PersonalityQuestion;

/// Axis order is fixed: the type string is always EI then SN then TF then JP.
const AXES: [(char, char); 4] = [('E', 'I'), ('S', 'N'), ('T', 'F'), ('J', 'P')];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Choice {
    A,
    B,
}

impl Choice {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Choice::A),
            "B" => Some(Choice::B),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PersonalityResponse {
    pub(crate) question_id: String,
    pub(crate) choice: Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Classification {
    pub(crate) ei: char,
    pub(crate) sn: char,
    pub(crate) tf: char,
    pub(crate) jp: char,
}

impl Classification {
    pub(crate) fn type_string(&self) -> String {
        format!("{}{}{}{}", self.ei, self.sn, self.tf, self.jp)
    }
}

/// The dichotomy letter a response votes for, or None when the question id
/// is not in the bank.
pub(crate) fn chosen_side(
    response: &PersonalityResponse,
    bank: &HashMap<String, PersonalityQuestion>,
) -> Option<char> {
    let question = bank.get(&response.question_id)?;
    let side = match response.choice {
        Choice::A => &question.positive_side,
        Choice::B => &question.negative_side,
    };
    side.chars().next().map(|letter| letter.to_ascii_uppercase())
}

/// Majority vote per axis; ties resolve to the first letter of the axis
/// (E over I, S over N, T over F, J over P). Unknown question ids are
/// skipped with a warning and contribute to no tally.
pub(crate) fn classify(
    responses: &[PersonalityResponse],
    bank: &HashMap<String, PersonalityQuestion>,
) -> Classification {
    let mut tallies: HashMap<char, u32> = HashMap::new();

    for response in responses {
        match chosen_side(response, bank) {
            Some(letter) => {
                *tallies.entry(letter).or_insert(0) += 1;
            }
            None => {
                tracing::warn!(
                    question_id = %response.question_id,
                    "Skipping personality response for unknown question"
                );
            }
        }
    }

    let resolved: Vec<char> = AXES
        .iter()
        .map(|&(first, second)| {
            let first_votes = tallies.get(&first).copied().unwrap_or(0);
            let second_votes = tallies.get(&second).copied().unwrap_or(0);
            if second_votes > first_votes {
                second
            } else {
                first
            }
        })
        .collect();

    Classification { ei: resolved[0], sn: resolved[1], tf: resolved[2], jp: resolved[3] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_entry(id: &str, positive: char, negative: char) -> (String, PersonalityQuestion) {
        (
            id.to_string(),
            PersonalityQuestion {
                id: id.to_string(),
                positive_side: positive.to_string(),
                negative_side: negative.to_string(),
            },
        )
    }

    fn response(question_id: &str, choice: Choice) -> PersonalityResponse {
        PersonalityResponse { question_id: question_id.to_string(), choice }
    }

    fn ei_bank(count: usize) -> HashMap<String, PersonalityQuestion> {
        (0..count).map(|index| bank_entry(&format!("p{index}"), 'E', 'I')).collect()
    }

    #[test]
    fn empty_responses_resolve_to_all_first_letters() {
        let classification = classify(&[], &HashMap::new());
        assert_eq!(classification.type_string(), "ESTJ");
    }

    #[test]
    fn majority_wins_per_axis() {
        let bank = ei_bank(4);
        let responses = vec![
            response("p0", Choice::A),
            response("p1", Choice::A),
            response("p2", Choice::A),
            response("p3", Choice::B),
        ];
        let classification = classify(&responses, &bank);
        assert_eq!(classification.ei, 'E');
    }

    #[test]
    fn minority_positive_still_loses() {
        let bank = ei_bank(3);
        let responses = vec![
            response("p0", Choice::B),
            response("p1", Choice::B),
            response("p2", Choice::A),
        ];
        let classification = classify(&responses, &bank);
        assert_eq!(classification.ei, 'I');
    }

    #[test]
    fn ties_resolve_to_first_axis_letter() {
        let mut bank = HashMap::new();
        bank.extend([bank_entry("e1", 'E', 'I'), bank_entry("e2", 'E', 'I')]);
        bank.extend([bank_entry("s1", 'S', 'N'), bank_entry("s2", 'S', 'N')]);
        bank.extend([bank_entry("t1", 'T', 'F'), bank_entry("t2", 'T', 'F')]);
        bank.extend([bank_entry("j1", 'J', 'P'), bank_entry("j2", 'J', 'P')]);

        let responses: Vec<PersonalityResponse> = ["e1", "s1", "t1", "j1"]
            .iter()
            .map(|id| response(id, Choice::A))
            .chain(["e2", "s2", "t2", "j2"].iter().map(|id| response(id, Choice::B)))
            .collect();

        let classification = classify(&responses, &bank);
        assert_eq!(classification.type_string(), "ESTJ");
    }

    #[test]
    fn unknown_question_ids_do_not_vote() {
        let bank = ei_bank(1);
        let responses = vec![
            response("p0", Choice::B),
            response("missing", Choice::A),
            response("missing2", Choice::A),
        ];
        let classification = classify(&responses, &bank);
        assert_eq!(classification.ei, 'I');
    }

    #[test]
    fn type_string_concatenates_in_axis_order() {
        let mut bank = HashMap::new();
        bank.extend([
            bank_entry("e", 'E', 'I'),
            bank_entry("s", 'S', 'N'),
            bank_entry("t", 'T', 'F'),
            bank_entry("j", 'J', 'P'),
        ]);
        let responses: Vec<PersonalityResponse> =
            ["e", "s", "t", "j"].iter().map(|id| response(id, Choice::B)).collect();
        let classification = classify(&responses, &bank);
        assert_eq!(classification.type_string(), "INFP");
    }

    #[test]
    fn chosen_side_follows_choice() {
        let bank: HashMap<_, _> = [bank_entry("p", 'E', 'I')].into_iter().collect();
        assert_eq!(chosen_side(&response("p", Choice::A), &bank), Some('E'));
        assert_eq!(chosen_side(&response("p", Choice::B), &bank), Some('I'));
        assert_eq!(chosen_side(&response("nope", Choice::A), &bank), None);
    }

    #[test]
    fn choice_parse_is_case_insensitive() {
        assert_eq!(Choice::parse("a"), Some(Choice::A));
        assert_eq!(Choice::parse(" B "), Some(Choice::B));
        assert_eq!(Choice::parse("C"), None);
    }
}
