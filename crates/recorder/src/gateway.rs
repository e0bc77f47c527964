//! Seams to the identity provider and the document store.

use async_trait::async_trait;
use chess_core::{NewSavedGame, SavedGame};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub account_id: i64,
    pub email: String,
}

/// Identity-change feed. The value held at subscription time is the
/// initial event; dropping the receiver unsubscribes.
pub type IdentitySubscription = watch::Receiver<Option<Identity>>;

/// A session with the identity provider.
///
/// A successful `create_account` or `authenticate` publishes the new
/// identity to every subscription; `end_session` publishes `None`.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, GatewayError>;
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, GatewayError>;
    async fn end_session(&self) -> Result<(), GatewayError>;
    fn subscribe(&self) -> IdentitySubscription;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListQuery {
    Owner(i64),
    All,
}

/// Saved-game collection. Listings are newest first.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create(&self, record: NewSavedGame) -> Result<i64, GatewayError>;
    async fn list(&self, query: ListQuery) -> Result<Vec<SavedGame>, GatewayError>;
    async fn get(&self, id: i64) -> Result<Option<SavedGame>, GatewayError>;
    async fn delete(&self, id: i64) -> Result<(), GatewayError>;
}
