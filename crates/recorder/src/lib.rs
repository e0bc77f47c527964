//! Chess game recorder: records a game move by move against a session
//! timer, saves it under a title and replays saved games ply by ply.
//!
//! The identity provider and the document store sit behind the traits in
//! [`gateway`]; [`memory`] has in-process implementations.

pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod notice;
pub mod timer;

pub use config::{DeletePolicy, ListScope, RecorderConfig};
pub use controller::{
    MoveOutcome, Recorder, RecordingSnapshot, ReplayFrame, SessionSnapshot, View,
};
pub use error::{GatewayError, RecorderError, Result};
pub use gateway::{Identity, IdentityGateway, IdentitySubscription, ListQuery, PersistenceGateway};
pub use memory::{MemoryIdentity, MemoryStore};
pub use notice::{Notice, NoticeLevel};
pub use timer::{SessionTimer, TimerSnapshot, TimerState};
