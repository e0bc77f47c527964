//! Recorder error types

use chess_core::{IllegalMove, ReconstructionError};
use thiserror::Error;

use crate::controller::View;

/// Failures reported by the identity provider or the document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account already exists")]
    AccountExists,

    #[error("{0}")]
    Rejected(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),

    #[error("Cannot {action} from the {view} screen")]
    InvalidTransition { view: View, action: &'static str },

    #[error("Sign-in required")]
    NotSignedIn,

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("No recording to save")]
    NothingToSave,

    #[error("Identity error: {0}")]
    Identity(GatewayError),

    #[error("Storage error: {0}")]
    Persistence(GatewayError),

    #[error("Saved game {0} not found")]
    NotFound(i64),

    #[error("Saved game {0} belongs to another account")]
    Forbidden(i64),

    #[error("Saved game is corrupt: {0}")]
    Corrupt(String),

    #[error("Saved game cannot be replayed: {0}")]
    Reconstruction(#[from] ReconstructionError),
}

pub type Result<T, E = RecorderError> = std::result::Result<T, E>;
