use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "examkind", rename_all = "lowercase")]
pub(crate) enum ExamKind {
    Regular,
    Departmental,
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attemptremarks", rename_all = "snake_case")]
pub(crate) enum AttemptRemarks {
    InProgress,
    PersonalityTest,
    Passed,
    Failed,
}

impl AttemptRemarks {
    /// Passed/Failed attempts accept no further answer writes.
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, AttemptRemarks::Passed | AttemptRemarks::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_remarks() {
        assert!(AttemptRemarks::Passed.is_terminal());
        assert!(AttemptRemarks::Failed.is_terminal());
        assert!(!AttemptRemarks::InProgress.is_terminal());
        assert!(!AttemptRemarks::PersonalityTest.is_terminal());
    }
}
