use redis::RedisError;
use time::Date;

use crate::core::redis::RedisHandle;

/// Staff-armed bypass for the schedule-day check, keyed per calendar day.
/// Missing redis never blocks an examinee: read failures degrade to
/// "not armed" and the regular date check applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScheduleOverridePolicy {
    pub(crate) armed: bool,
}

fn override_key(day: Date) -> String {
    format!("schedule:override:{day}")
}

pub(crate) async fn current(redis: &RedisHandle, day: Date) -> ScheduleOverridePolicy {
    match redis.get(&override_key(day)).await {
        Ok(value) => ScheduleOverridePolicy { armed: value.is_some() },
        Err(err) => {
            tracing::warn!(error = %err, "Schedule override read failed, treating as not armed");
            ScheduleOverridePolicy { armed: false }
        }
    }
}

pub(crate) async fn arm(
    redis: &RedisHandle,
    day: Date,
    ttl_seconds: u64,
) -> Result<(), RedisError> {
    redis.set_with_ttl(&override_key(day), "1", ttl_seconds).await
}

impl ScheduleOverridePolicy {
    /// Whether a schedule exam scheduled for `scheduled_on` may be taken on
    /// `today`. Exams with no scheduled date are always open.
    pub(crate) fn allows(&self, scheduled_on: Option<Date>, today: Date) -> bool {
        if self.armed {
            return true;
        }
        match scheduled_on {
            Some(day) => day == today,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn key_includes_the_day() {
        assert_eq!(override_key(date!(2025 - 06 - 01)), "schedule:override:2025-06-01");
    }

    #[test]
    fn unarmed_policy_requires_the_scheduled_day() {
        let policy = ScheduleOverridePolicy { armed: false };
        assert!(policy.allows(Some(date!(2025 - 06 - 01)), date!(2025 - 06 - 01)));
        assert!(!policy.allows(Some(date!(2025 - 06 - 01)), date!(2025 - 06 - 02)));
    }

    #[test]
    fn armed_policy_bypasses_the_date_check() {
        let policy = ScheduleOverridePolicy { armed: true };
        assert!(policy.allows(Some(date!(2025 - 06 - 01)), date!(2025 - 06 - 02)));
    }

    #[test]
    fn unscheduled_exams_are_always_open() {
        let policy = ScheduleOverridePolicy { armed: false };
        assert!(policy.allows(None, date!(2025 - 06 - 02)));
    }
}
