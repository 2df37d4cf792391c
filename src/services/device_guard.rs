use time::{Duration, PrimitiveDateTime};
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::DeviceToken;
use crate::repositories::{attempts, device_tokens};

#[derive(Debug, Clone, Copy)]
pub(crate) struct GuardPolicy {
    pub(crate) token_max_age: Duration,
    pub(crate) device_grace: Duration,
}

impl GuardPolicy {
    pub(crate) fn new(token_max_age_days: u64, device_grace_minutes: u64) -> Self {
        Self {
            token_max_age: Duration::days(token_max_age_days as i64),
            device_grace: Duration::minutes(device_grace_minutes as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoginDecision {
    /// Login may proceed once the listed token ids are revoked.
    Allow { revoke: Vec<String> },
    /// A different device holds a fresh token; the caller must refuse.
    Blocked,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LoginError {
    #[error("Another device is already logged in to this account")]
    AlreadyLoggedInElsewhere,
    #[error("An exam is currently in progress on another session")]
    ExamInProgress,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Reconciles the account's live tokens against an incoming login.
///
/// Two-tier ageing: tokens past the max age are revoked unconditionally,
/// then a same-device match refreshes the session, then a different non-empty
/// device blocks only while its token is younger than the grace window.
/// Tokens with no device binding are treated as orphans. Every allowed login
/// revokes all surviving tokens so at most the freshly issued one stays live.
pub(crate) fn evaluate(
    tokens: &[DeviceToken],
    device_id: Option<&str>,
    now: PrimitiveDateTime,
    policy: GuardPolicy,
) -> LoginDecision {
    let mut revoke: Vec<String> = Vec::new();
    let mut live: Vec<&DeviceToken> = Vec::new();

    for token in tokens {
        if now - token.created_at >= policy.token_max_age {
            revoke.push(token.id.clone());
        } else {
            live.push(token);
        }
    }

    let incoming = device_id.filter(|id| !id.is_empty());

    let same_device = incoming
        .is_some_and(|id| live.iter().any(|token| token.device_id.as_deref() == Some(id)));

    if !same_device {
        let fresh_conflict = live.iter().any(|token| {
            let bound = token.device_id.as_deref().filter(|id| !id.is_empty());
            bound.is_some_and(|id| Some(id) != incoming)
                && now - token.created_at < policy.device_grace
        });
        if fresh_conflict {
            return LoginDecision::Blocked;
        }
    }

    revoke.extend(live.iter().map(|token| token.id.clone()));
    LoginDecision::Allow { revoke }
}

/// Runs the full login-time token reconciliation inside one transaction:
/// attempt check, row-locked token read, revocations, and the new token
/// insert all commit together so concurrent logins serialize.
pub(crate) async fn authorize(
    db: &sqlx::PgPool,
    examinee_id: &str,
    device_id: Option<&str>,
    policy: GuardPolicy,
) -> Result<String, LoginError> {
    let now = primitive_now_utc();
    let mut tx = db.begin().await?;

    if attempts::any_in_progress(&mut *tx, examinee_id).await? {
        return Err(LoginError::ExamInProgress);
    }

    let active = device_tokens::list_active_for_update(&mut *tx, examinee_id, now).await?;
    let revoke = match evaluate(&active, device_id, now, policy) {
        LoginDecision::Blocked => return Err(LoginError::AlreadyLoggedInElsewhere),
        LoginDecision::Allow { revoke } => revoke,
    };

    let revoked = device_tokens::revoke_ids(&mut *tx, &revoke).await?;
    if revoked > 0 {
        tracing::info!(examinee_id, revoked, "Revoked stale device tokens at login");
    }

    let token_id = Uuid::new_v4().to_string();
    device_tokens::create(
        &mut *tx,
        device_tokens::CreateToken {
            id: &token_id,
            examinee_id,
            device_id,
            created_at: now,
            expires_at: Some(now + policy.token_max_age),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(token_id)
}

/// The forced-logout escape hatch: revokes everything, optionally sparing the
/// caller's current token. Bypasses the grace-window heuristics entirely.
pub(crate) async fn force_logout(
    db: &sqlx::PgPool,
    examinee_id: &str,
    spared_token_id: Option<&str>,
) -> Result<u64, sqlx::Error> {
    device_tokens::revoke_all_except(db, examinee_id, spared_token_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn policy() -> GuardPolicy {
        GuardPolicy::new(30, 60)
    }

    fn token(id: &str, device_id: Option<&str>, created_at: PrimitiveDateTime) -> DeviceToken {
        DeviceToken {
            id: id.to_string(),
            examinee_id: "ex-1".to_string(),
            device_id: device_id.map(str::to_string),
            created_at,
            expires_at: None,
            revoked: false,
        }
    }

    const NOW: PrimitiveDateTime = datetime!(2025-06-01 12:00);

    #[test]
    fn no_tokens_allows_with_nothing_to_revoke() {
        let decision = evaluate(&[], Some("X"), NOW, policy());
        assert_eq!(decision, LoginDecision::Allow { revoke: vec![] });
    }

    #[test]
    fn same_device_refresh_revokes_the_old_token() {
        let tokens = vec![token("t1", Some("X"), NOW - Duration::minutes(10))];
        let decision = evaluate(&tokens, Some("X"), NOW, policy());
        assert_eq!(decision, LoginDecision::Allow { revoke: vec!["t1".to_string()] });
    }

    #[test]
    fn different_device_inside_grace_window_blocks() {
        let tokens = vec![token("t1", Some("X"), NOW - Duration::minutes(10))];
        let decision = evaluate(&tokens, Some("Y"), NOW, policy());
        assert_eq!(decision, LoginDecision::Blocked);
    }

    #[test]
    fn different_device_past_grace_window_is_reclaimed() {
        let tokens = vec![token("t1", Some("X"), NOW - Duration::hours(2))];
        let decision = evaluate(&tokens, Some("Y"), NOW, policy());
        assert_eq!(decision, LoginDecision::Allow { revoke: vec!["t1".to_string()] });
    }

    #[test]
    fn very_old_token_never_blocks_even_from_another_device() {
        let tokens = vec![token("t1", Some("X"), NOW - Duration::days(31))];
        let decision = evaluate(&tokens, Some("Y"), NOW, policy());
        assert_eq!(decision, LoginDecision::Allow { revoke: vec!["t1".to_string()] });
    }

    #[test]
    fn unbound_tokens_are_orphans_not_conflicts() {
        let tokens = vec![
            token("t1", None, NOW - Duration::minutes(5)),
            token("t2", Some(""), NOW - Duration::minutes(5)),
        ];
        let decision = evaluate(&tokens, Some("Y"), NOW, policy());
        assert_eq!(
            decision,
            LoginDecision::Allow { revoke: vec!["t1".to_string(), "t2".to_string()] }
        );
    }

    #[test]
    fn same_device_match_wins_over_a_fresh_conflict() {
        let tokens = vec![
            token("t1", Some("X"), NOW - Duration::minutes(5)),
            token("t2", Some("Y"), NOW - Duration::minutes(5)),
        ];
        let decision = evaluate(&tokens, Some("X"), NOW, policy());
        assert_eq!(
            decision,
            LoginDecision::Allow { revoke: vec!["t1".to_string(), "t2".to_string()] }
        );
    }

    #[test]
    fn missing_incoming_device_still_blocks_on_fresh_bound_token() {
        let tokens = vec![token("t1", Some("X"), NOW - Duration::minutes(5))];
        assert_eq!(evaluate(&tokens, None, NOW, policy()), LoginDecision::Blocked);
    }
}
