//! One [`Recorder`] per signed-in account.
//!
//! Handlers lock a session for the whole request, so actions on one
//! account's recorder never interleave. Sessions are kept in memory only; a
//! restart brings a token holder back to the list screen. Sessions left idle
//! longer than the configured TTL are dropped by [`SessionRegistry::sweep`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use recorder::{Identity, Recorder, RecorderConfig, RecorderError};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::auth::identity::PgIdentity;
use crate::auth::middleware::AuthUser;
use crate::db::recordings::PgRecordingStore;

pub type SharedRecorder = Arc<Mutex<Recorder>>;

struct SessionEntry {
    recorder: SharedRecorder,
    last_seen: Instant,
}

impl SessionEntry {
    fn new(recorder: SharedRecorder, now: Instant) -> Self {
        Self {
            recorder,
            last_seen: now,
        }
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    pool: PgPool,
    store: Arc<PgRecordingStore>,
    config: RecorderConfig,
    idle_ttl: Duration,
    sessions: Arc<Mutex<HashMap<i64, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new(pool: PgPool, config: RecorderConfig, idle_ttl: Duration) -> Self {
        Self {
            store: Arc::new(PgRecordingStore::new(pool.clone())),
            pool,
            config,
            idle_ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The caller's session, created on the list screen if missing.
    pub async fn for_user(&self, user: &AuthUser) -> SharedRecorder {
        if let Some(entry) = self.sessions.lock().await.get_mut(&user.id) {
            entry.last_seen = Instant::now();
            return Arc::clone(&entry.recorder);
        }

        // Starting loads the saved-games list; keep the map unlocked meanwhile.
        let identity = PgIdentity::signed_in(self.pool.clone(), user.identity());
        let mut recorder = self.recorder(identity);
        recorder.start().await;

        let mut sessions = self.sessions.lock().await;
        let shared = insert_or_keep(&mut sessions, user.id, recorder, Instant::now());
        tracing::info!(account_id = user.id, "Session opened from token");
        shared
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, RecorderError> {
        let mut recorder = self.signed_out().await;
        let identity = recorder.sign_up(email, password).await?;
        self.adopt(&identity, recorder).await;
        Ok(identity)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, RecorderError> {
        let mut recorder = self.signed_out().await;
        let identity = recorder.sign_in(email, password).await?;
        self.adopt(&identity, recorder).await;
        Ok(identity)
    }

    /// End the caller's session. Returns the recorder, now on the auth
    /// screen, so the caller can report its final state.
    pub async fn logout(&self, user: &AuthUser) -> Result<SharedRecorder, RecorderError> {
        let session = self.for_user(user).await;
        self.sessions.lock().await.remove(&user.id);
        session.lock().await.sign_out().await?;
        tracing::info!(account_id = user.id, "Session closed");
        Ok(session)
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drop sessions idle longer than the TTL and stop their timers.
    /// Returns how many were evicted.
    pub async fn sweep(&self) -> usize {
        let evicted = {
            let mut sessions = self.sessions.lock().await;
            evict_idle(&mut sessions, Instant::now(), self.idle_ttl)
        };
        shut_down(&evicted).await;
        evicted.len()
    }

    /// Sweep every `period` until the process exits.
    pub async fn run_sweeper(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match self.sweep().await {
                0 => {}
                n => tracing::info!(evicted = n, "Evicted idle sessions"),
            }
        }
    }

    async fn signed_out(&self) -> Recorder {
        let mut recorder = self.recorder(PgIdentity::new(self.pool.clone()));
        recorder.start().await;
        recorder
    }

    /// Keep an existing session (another device) rather than replacing it.
    async fn adopt(&self, identity: &Identity, recorder: Recorder) {
        let mut sessions = self.sessions.lock().await;
        insert_or_keep(&mut sessions, identity.account_id, recorder, Instant::now());
    }

    fn recorder(&self, identity: PgIdentity) -> Recorder {
        Recorder::new(self.config.clone(), Arc::new(identity), self.store.clone())
    }
}

/// Insert `recorder` unless another request registered the account first;
/// the loser is dropped, which shuts it down.
fn insert_or_keep(
    sessions: &mut HashMap<i64, SessionEntry>,
    account_id: i64,
    recorder: Recorder,
    now: Instant,
) -> SharedRecorder {
    let entry = sessions
        .entry(account_id)
        .or_insert_with(|| SessionEntry::new(Arc::new(Mutex::new(recorder)), now));
    entry.last_seen = now;
    Arc::clone(&entry.recorder)
}

fn evict_idle(
    sessions: &mut HashMap<i64, SessionEntry>,
    now: Instant,
    ttl: Duration,
) -> Vec<SharedRecorder> {
    let mut evicted = Vec::new();
    sessions.retain(|account_id, entry| {
        if now.saturating_duration_since(entry.last_seen) < ttl {
            return true;
        }
        tracing::debug!(account_id = *account_id, "Session idle, evicting");
        evicted.push(Arc::clone(&entry.recorder));
        false
    });
    evicted
}

/// A handler may still hold an evicted recorder; wait for it before stopping.
async fn shut_down(evicted: &[SharedRecorder]) {
    for recorder in evicted {
        recorder.lock().await.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder::{MemoryIdentity, MemoryStore, TimerState, View};

    async fn recording() -> Recorder {
        let mut recorder = Recorder::new(
            RecorderConfig::manual(),
            Arc::new(MemoryIdentity::new()),
            Arc::new(MemoryStore::new()),
        );
        recorder.start().await;
        recorder.sign_up("idle@example.com", "hunter22").await.unwrap();
        recorder.start_recording().unwrap();
        assert_eq!(recorder.view(), View::Record);
        recorder
    }

    async fn recording_session() -> SharedRecorder {
        Arc::new(Mutex::new(recording().await))
    }

    #[tokio::test]
    async fn test_insert_or_keep_prefers_first_session() {
        let start = Instant::now();
        let mut sessions = HashMap::new();

        let first = insert_or_keep(&mut sessions, 3, recording().await, start);
        let later = start + Duration::from_secs(5);
        let second = insert_or_keep(&mut sessions, 3, recording().await, later);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[&3].last_seen, later);
    }

    #[tokio::test]
    async fn test_evict_idle_drops_stale_sessions_only() {
        let ttl = Duration::from_secs(60);
        let start = Instant::now();
        let stale = recording_session().await;
        let fresh = recording_session().await;

        let mut sessions = HashMap::new();
        sessions.insert(1, SessionEntry::new(Arc::clone(&stale), start));
        sessions.insert(
            2,
            SessionEntry::new(Arc::clone(&fresh), start + Duration::from_secs(50)),
        );

        let evicted = evict_idle(&mut sessions, start + Duration::from_secs(61), ttl);
        assert_eq!(evicted.len(), 1);
        assert!(Arc::ptr_eq(&evicted[0], &stale));
        assert!(sessions.contains_key(&2));
        assert!(!sessions.contains_key(&1));

        shut_down(&evicted).await;
        assert_eq!(stale.lock().await.timer().state(), TimerState::Stopped);
        assert_eq!(fresh.lock().await.timer().state(), TimerState::Running);
    }

    #[tokio::test]
    async fn test_evict_idle_keeps_sessions_within_ttl() {
        let start = Instant::now();
        let mut sessions = HashMap::new();
        sessions.insert(7, SessionEntry::new(recording_session().await, start));

        let evicted = evict_idle(&mut sessions, start, Duration::from_secs(1));
        assert!(evicted.is_empty());
        assert_eq!(sessions.len(), 1);
    }
}
