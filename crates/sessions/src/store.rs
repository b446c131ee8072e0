use dashmap::DashMap;

use crate::session::Session;

/// Concurrent map from user id to [`Session`].
///
/// All access goes through short closure-scoped entry guards so a guard is
/// never held across an await point. The entry API makes the
/// default-record-creation path atomic per key: two concurrent first events
/// for the same user observe a single session.
///
/// There is deliberately no capacity bound or expiry; sessions live for the
/// lifetime of the process.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<u64, Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the user's session, creating the default record
    /// first if the user is new. Returns whatever `f` returns.
    pub fn update<R>(&self, user_id: u64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut entry = self.sessions.entry(user_id).or_default();
        f(entry.value_mut())
    }

    /// Clone of the user's current session (default if the user is new).
    #[must_use]
    pub fn snapshot(&self, user_id: u64) -> Session {
        self.sessions
            .get(&user_id)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Reset the user's session to defaults. The key stays in the map,
    /// which is observably the same as removing it.
    pub fn clear(&self, user_id: u64) {
        self.update(user_id, Session::reset);
    }

    /// Number of sessions ever touched (for logging).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
