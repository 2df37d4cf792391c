pub(crate) mod answers;
pub(crate) mod attempts;
pub(crate) mod course_rules;
pub(crate) mod device_tokens;
pub(crate) mod examinees;
pub(crate) mod exams;
pub(crate) mod personality;
pub(crate) mod questions;
pub(crate) mod recommendations;
