pub(crate) mod attempt_flow;
pub(crate) mod device_guard;
pub(crate) mod exam_codes;
pub(crate) mod personality;
pub(crate) mod recommendation;
pub(crate) mod schedule_override;
pub(crate) mod scoring;
