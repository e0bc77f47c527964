//! In-process gateways for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chess_core::{NewSavedGame, SavedGame};
use chrono::{Duration, Utc};
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::gateway::{Identity, IdentityGateway, IdentitySubscription, ListQuery, PersistenceGateway};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct AccountDirectory {
    next_id: i64,
    // email (lowercased) -> (account id, password)
    accounts: HashMap<String, (i64, String)>,
}

/// Identity provider keeping accounts in memory. Clones made with
/// [`MemoryIdentity::new_session`] share accounts but not the session.
pub struct MemoryIdentity {
    directory: Arc<Mutex<AccountDirectory>>,
    session: watch::Sender<Option<Identity>>,
    unavailable: AtomicBool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            directory: Arc::new(Mutex::new(AccountDirectory::default())),
            session: watch::Sender::new(None),
            unavailable: AtomicBool::new(false),
        }
    }

    /// A fresh signed-out session over the same accounts.
    pub fn new_session(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            session: watch::Sender::new(None),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate the provider being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable("identity provider offline".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityGateway for MemoryIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, GatewayError> {
        self.check_available()?;
        if !email.contains('@') {
            return Err(GatewayError::Rejected("Invalid email address".into()));
        }
        if password.len() < 6 {
            return Err(GatewayError::Rejected(
                "Password must be at least 6 characters".into(),
            ));
        }

        let identity = {
            let mut dir = lock(&self.directory);
            let key = email.to_lowercase();
            if dir.accounts.contains_key(&key) {
                return Err(GatewayError::AccountExists);
            }
            dir.next_id += 1;
            let id = dir.next_id;
            dir.accounts.insert(key, (id, password.to_string()));
            Identity {
                account_id: id,
                email: email.to_string(),
            }
        };

        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, GatewayError> {
        self.check_available()?;
        let identity = {
            let dir = lock(&self.directory);
            match dir.accounts.get(&email.to_lowercase()) {
                Some((id, stored)) if stored == password => Identity {
                    account_id: *id,
                    email: email.to_string(),
                },
                _ => return Err(GatewayError::InvalidCredentials),
            }
        };

        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        self.check_available()?;
        self.session.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> IdentitySubscription {
        self.session.subscribe()
    }
}

/// Document store keeping saved games in memory.
#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    games: Mutex<HashMap<i64, SavedGame>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Overwrite a record out-of-band, bypassing every check.
    pub fn tamper(&self, game: SavedGame) {
        lock(&self.games).insert(game.id, game);
    }

    pub fn len(&self) -> usize {
        lock(&self.games).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable("document store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn create(&self, record: NewSavedGame) -> Result<i64, GatewayError> {
        self.check_available()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        // Strictly increasing timestamps keep newest-first ordering stable.
        let created_at = Utc::now() + Duration::milliseconds(id);
        lock(&self.games).insert(id, SavedGame::from_new(id, created_at, record));
        Ok(id)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<SavedGame>, GatewayError> {
        self.check_available()?;
        let mut games: Vec<SavedGame> = lock(&self.games)
            .values()
            .filter(|g| match query {
                ListQuery::Owner(owner) => g.owner_id == owner,
                ListQuery::All => true,
            })
            .cloned()
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(games)
    }

    async fn get(&self, id: i64) -> Result<Option<SavedGame>, GatewayError> {
        self.check_available()?;
        Ok(lock(&self.games).get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), GatewayError> {
        self.check_available()?;
        lock(&self.games).remove(&id);
        Ok(())
    }
}
