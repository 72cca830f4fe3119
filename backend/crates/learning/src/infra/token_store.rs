//! In-memory Session Token Store
//!
//! Forward (user → token, issue time) and reverse (token → user) maps
//! behind one mutex. Expired tokens are not swept; they are rejected when
//! next presented. Nothing is persisted, so a restart drops every session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::crypto::{OsRandom, RandomSource, to_hex};

use crate::application::config::LearningConfig;
use crate::domain::repository::TokenStore;
use crate::domain::value_objects::SessionToken;
use crate::error::{LearningError, LearningResult};

#[derive(Debug, Default)]
struct Sessions {
    by_user: HashMap<UserId, (SessionToken, DateTime<Utc>)>,
    by_token: HashMap<String, UserId>,
}

pub struct InMemoryTokenStore {
    sessions: Mutex<Sessions>,
    ttl: Duration,
    token_bytes_len: usize,
    random: Arc<dyn RandomSource>,
}

impl InMemoryTokenStore {
    pub fn new(config: &LearningConfig) -> Self {
        Self::with_random(config, Arc::new(OsRandom))
    }

    pub fn with_random(config: &LearningConfig, random: Arc<dyn RandomSource>) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            ttl: config.token_ttl,
            token_bytes_len: config.token_bytes_len,
            random,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // The maps stay consistent even if a holder panicked
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes_len];
        self.random.fill(&mut bytes);
        to_hex(&bytes)
    }

    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> SessionToken {
        let mut sessions = self.lock();

        let mut raw = self.generate();
        while sessions.by_token.contains_key(&raw) {
            tracing::warn!("Session token collision, regenerating");
            raw = self.generate();
        }

        // The previous token of this user is orphaned, not removed
        let token = SessionToken::new(raw.clone());
        sessions.by_token.insert(raw, user_id);
        sessions.by_user.insert(user_id, (token.clone(), now));

        tracing::debug!(user_id = %user_id, "Session token issued");
        token
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> LearningResult<UserId> {
        let sessions = self.lock();

        let user_id = *sessions
            .by_token
            .get(token)
            .ok_or(LearningError::InvalidToken)?;
        // Age is measured from the user's latest issue; a revoked user has
        // no entry left
        let (_, issued_at) = sessions
            .by_user
            .get(&user_id)
            .ok_or(LearningError::InvalidToken)?;

        match (now - *issued_at).to_std() {
            Ok(elapsed) if elapsed > self.ttl => {
                tracing::debug!(user_id = %user_id, "Session token expired");
                Err(LearningError::ExpiredToken)
            }
            _ => Ok(user_id),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn issue(&self, user_id: UserId) -> SessionToken {
        self.issue_at(user_id, Utc::now())
    }

    fn revoke(&self, user_id: UserId) -> LearningResult<()> {
        let mut sessions = self.lock();
        let (token, _) = sessions
            .by_user
            .remove(&user_id)
            .ok_or(LearningError::NotFound {
                entity: "session",
                id: Some(user_id.value()),
            })?;
        sessions.by_token.remove(token.as_str());
        Ok(())
    }

    fn validate(&self, token: &str) -> LearningResult<UserId> {
        self.validate_at(token, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the same bytes for the first `repeats` calls, then counts up
    struct Scripted {
        calls: AtomicUsize,
        repeats: usize,
    }

    impl RandomSource for Scripted {
        fn fill(&self, buf: &mut [u8]) {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let value = if n < self.repeats { 0 } else { n as u8 };
            buf.fill(value);
        }
    }

    fn store() -> InMemoryTokenStore {
        InMemoryTokenStore::new(&LearningConfig::default())
    }

    #[test]
    fn test_issue_then_validate_returns_user() {
        let store = store();
        let token = store.issue(UserId::from_raw(7));
        assert_eq!(token.as_str().len(), 32);
        assert_eq!(store.validate(token.as_str()).unwrap(), UserId::from_raw(7));
    }

    #[test]
    fn test_expired_after_one_hour() {
        let store = store();
        let issued = Utc::now();
        let token = store.issue_at(UserId::from_raw(1), issued);

        let at_hour = issued + TimeDelta::minutes(60);
        assert!(store.validate_at(token.as_str(), at_hour).is_ok());

        let later = issued + TimeDelta::minutes(61);
        assert!(matches!(
            store.validate_at(token.as_str(), later),
            Err(LearningError::ExpiredToken)
        ));
    }

    #[test]
    fn test_unknown_token_is_invalid() {
        assert!(matches!(
            store().validate("0123456789abcdef"),
            Err(LearningError::InvalidToken)
        ));
    }

    #[test]
    fn test_revoke() {
        let store = store();
        let user = UserId::from_raw(3);
        let token = store.issue(user);

        store.revoke(user).unwrap();
        assert!(matches!(
            store.validate(token.as_str()),
            Err(LearningError::InvalidToken)
        ));
        assert!(matches!(
            store.revoke(user),
            Err(LearningError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reissue_orphans_previous_token() {
        let store = store();
        let user = UserId::from_raw(9);
        let issued = Utc::now();
        let first = store.issue_at(user, issued);
        let second = store.issue_at(user, issued + TimeDelta::minutes(30));

        assert_ne!(first, second);
        assert_eq!(store.validate_at(second.as_str(), issued).unwrap(), user);
        // still mapped to the user, aged from the latest issue
        let at = issued + TimeDelta::minutes(80);
        assert_eq!(store.validate_at(first.as_str(), at).unwrap(), user);

        // revoking removes only the current token; the orphan no longer
        // resolves to a live session
        store.revoke(user).unwrap();
        assert!(matches!(
            store.validate(first.as_str()),
            Err(LearningError::InvalidToken)
        ));
    }

    #[test]
    fn test_collision_is_regenerated() {
        let random = Arc::new(Scripted {
            calls: AtomicUsize::new(0),
            repeats: 2,
        });
        let store = InMemoryTokenStore::with_random(&LearningConfig::default(), random);

        let a = store.issue(UserId::from_raw(1));
        let b = store.issue(UserId::from_raw(2));

        assert_ne!(a, b);
        assert_eq!(store.validate(a.as_str()).unwrap(), UserId::from_raw(1));
        assert_eq!(store.validate(b.as_str()).unwrap(), UserId::from_raw(2));
    }
}
