//! Screen state machine for one signed-in (or signed-out) session.
//!
//! The [`Recorder`] owns the live game, the move log, the session timer and
//! the replay state. Every action is checked against the current [`View`];
//! an action the current screen does not offer fails with
//! [`RecorderError::InvalidTransition`] and leaves the state untouched.
//!
//! Identity changes arrive through the gateway's watch channel. Every action
//! applies a pending change before checking its screen, so once the provider
//! ends the session nothing more is recorded or saved.

use std::fmt;
use std::sync::Arc;

use chess_core::replay::validate;
use chess_core::{
    reconstruct, GameFacade, GameStatus, MoveLog, NewSavedGame, RecordedMove, ReplayCursor, Role,
    SavedGame, SavedGameSummary, Side, Square,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{DeletePolicy, ListScope, RecorderConfig};
use crate::error::{GatewayError, RecorderError, Result};
use crate::gateway::{Identity, IdentityGateway, IdentitySubscription, ListQuery, PersistenceGateway};
use crate::notice::Notice;
use crate::timer::{SessionTimer, TimerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Auth,
    List,
    Record,
    Replay,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Auth => "auth",
            View::List => "list",
            View::Record => "record",
            View::Replay => "replay",
        };
        f.write_str(name)
    }
}

/// Result of a move accepted during recording.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    #[serde(rename = "move")]
    pub mv: RecordedMove,
    pub san: String,
    pub ply: usize,
    pub fen: String,
    pub status: GameStatus,
    /// Screen after the move; `List` when the move ended the game.
    pub view: View,
}

/// What the replay screen shows at the current cursor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFrame {
    pub game_id: i64,
    pub title: String,
    pub ply: usize,
    pub total: usize,
    pub duration: String,
    pub fen: String,
    pub board_fen: String,
    pub turn: Side,
    pub last_move: Option<RecordedMove>,
    pub last_san: Option<String>,
    pub status: GameStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSnapshot {
    pub fen: String,
    pub board_fen: String,
    pub turn: Side,
    pub moves: Vec<RecordedMove>,
    pub move_count: usize,
    pub sealed: bool,
    pub unsaved: bool,
    pub status: GameStatus,
    pub timer: TimerSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub view: View,
    pub identity: Option<Identity>,
    pub recording: RecordingSnapshot,
    pub replay: Option<ReplayFrame>,
    pub games: Vec<SavedGameSummary>,
}

struct Replay {
    game: SavedGame,
    cursor: ReplayCursor,
}

pub struct Recorder {
    config: RecorderConfig,
    identity_gateway: Arc<dyn IdentityGateway>,
    store: Arc<dyn PersistenceGateway>,
    subscription: Option<IdentitySubscription>,
    view: View,
    identity: Option<Identity>,
    game: GameFacade,
    log: MoveLog,
    timer: SessionTimer,
    /// A finished recording is waiting for a title.
    unsaved: bool,
    games: Vec<SavedGameSummary>,
    replay: Option<Replay>,
    notices: Vec<Notice>,
}

impl Recorder {
    pub fn new(
        config: RecorderConfig,
        identity_gateway: Arc<dyn IdentityGateway>,
        store: Arc<dyn PersistenceGateway>,
    ) -> Self {
        let subscription = identity_gateway.subscribe();
        let mut log = MoveLog::new();
        log.seal();
        Self {
            timer: SessionTimer::new(config.tick_period),
            config,
            identity_gateway,
            store,
            subscription: Some(subscription),
            view: View::Auth,
            identity: None,
            game: GameFacade::new(),
            log,
            unsaved: false,
            games: Vec::new(),
            replay: None,
            notices: Vec::new(),
        }
    }

    /// Apply the identity held by the provider at subscription time.
    pub async fn start(&mut self) -> View {
        let initial = match self.subscription.as_mut() {
            Some(rx) => rx.borrow_and_update().clone(),
            None => None,
        };
        if self.apply_identity(initial) {
            let _ = self.refresh_list().await;
        }
        self.view
    }

    /// Apply a pending identity change, if any, and load the list for a
    /// newly signed-in account.
    pub async fn pump_identity(&mut self) {
        if self.sync_identity() {
            let _ = self.refresh_list().await;
        }
    }

    /// Apply a pending identity change without touching the store. Every
    /// action runs this first so a session ended by the provider is never
    /// acted on. Returns whether a new account signed in.
    fn sync_identity(&mut self) -> bool {
        let Some(rx) = self.subscription.as_mut() else {
            return false;
        };
        if !rx.has_changed().unwrap_or(false) {
            return false;
        }
        let next = rx.borrow_and_update().clone();
        self.apply_identity(next)
    }

    fn apply_identity(&mut self, next: Option<Identity>) -> bool {
        match next {
            None => {
                if let Some(previous) = self.identity.take() {
                    info!(account_id = previous.account_id, from = %self.view, "Signed out");
                }
                self.reset_session();
                self.view = View::Auth;
                false
            }
            Some(identity) => {
                let same_account = self
                    .identity
                    .as_ref()
                    .is_some_and(|current| current.account_id == identity.account_id);
                if same_account {
                    self.identity = Some(identity);
                    return false;
                }
                if self.identity.is_some() {
                    self.reset_session();
                }
                info!(account_id = identity.account_id, "Signed in");
                self.identity = Some(identity);
                self.view = View::List;
                true
            }
        }
    }

    /// Drop everything tied to the previous account.
    fn reset_session(&mut self) {
        self.timer.stop();
        if self.unsaved || !self.log.is_sealed() {
            warn!(moves = self.log.len(), "Discarding unsaved recording");
        }
        self.log.clear();
        self.log.seal();
        self.game = GameFacade::new();
        self.unsaved = false;
        self.replay = None;
        self.games.clear();
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<Identity> {
        self.pump_identity().await;
        self.require(View::Auth, "create an account")?;
        match self.identity_gateway.create_account(email, password).await {
            Ok(identity) => {
                self.notices.push(Notice::success("Account created"));
                self.pump_identity().await;
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Account creation failed");
                self.notices.push(Notice::error(e.to_string()));
                Err(RecorderError::Identity(e))
            }
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity> {
        self.pump_identity().await;
        self.require(View::Auth, "sign in")?;
        match self.identity_gateway.authenticate(email, password).await {
            Ok(identity) => {
                self.notices.push(Notice::success("Signed in"));
                self.pump_identity().await;
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.notices.push(Notice::error(e.to_string()));
                Err(RecorderError::Identity(e))
            }
        }
    }

    /// Allowed from any signed-in screen. A recording in progress is lost.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.pump_identity().await;
        if self.identity.is_none() {
            return Err(self.reject("sign out"));
        }
        match self.identity_gateway.end_session().await {
            Ok(()) => {
                self.notices.push(Notice::success("Signed out"));
                self.pump_identity().await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Sign-out failed");
                self.notices.push(Notice::error("Sign out failed"));
                Err(RecorderError::Identity(e))
            }
        }
    }

    /// Reload the saved-games list. On failure the previous list is kept.
    pub async fn refresh_list(&mut self) -> Result<&[SavedGameSummary]> {
        self.sync_identity();
        let Some(account_id) = self.identity.as_ref().map(|i| i.account_id) else {
            return Err(RecorderError::NotSignedIn);
        };
        let query = match self.config.list_scope {
            ListScope::Owner => ListQuery::Owner(account_id),
            ListScope::Global => ListQuery::All,
        };
        match self.store.list(query).await {
            Ok(games) => {
                self.games = games.iter().map(SavedGame::summary).collect();
                debug!(count = self.games.len(), "Loaded saved games");
                Ok(&self.games)
            }
            Err(e) => {
                error!(error = %e, "Failed to load saved games");
                self.notices.push(Notice::error("Failed to load saved games"));
                Err(RecorderError::Persistence(e))
            }
        }
    }

    /// Start a fresh recording. An unsaved finished recording is discarded.
    pub fn start_recording(&mut self) -> Result<()> {
        self.sync_identity();
        self.require(View::List, "start recording")?;
        if self.unsaved {
            warn!(moves = self.log.len(), "Discarding unsaved recording");
        }
        self.game = GameFacade::new();
        self.log.clear();
        self.unsaved = false;
        self.timer.start();
        self.view = View::Record;
        info!("Recording started");
        Ok(())
    }

    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<MoveOutcome> {
        self.sync_identity();
        self.require(View::Record, "make a move")?;
        if self.log.is_sealed() {
            return Err(self.reject("make a move"));
        }

        let mv = match self.game.attempt_move(from, to, promotion) {
            Ok(mv) => mv,
            Err(e) => {
                debug!(error = %e, "Move refused");
                self.notices.push(Notice::error("Illegal move"));
                return Err(e.into());
            }
        };
        if self.log.append(mv).is_err() {
            // Unreachable while the seal check above holds.
            return Err(self.reject("make a move"));
        }

        let status = self.game.status();
        debug!(mv = %mv, ply = self.game.ply(), "Move recorded");
        match status {
            GameStatus::Checkmate { winner } => {
                info!(?winner, "Checkmate");
                self.notices.push(Notice::success("Checkmate!"));
                self.finish_recording();
            }
            GameStatus::Draw { reason } => {
                info!(?reason, "Draw");
                self.notices.push(Notice::success("Draw"));
                self.finish_recording();
            }
            GameStatus::Ongoing => {}
        }

        Ok(MoveOutcome {
            mv,
            san: self.game.last_san().unwrap_or_default().to_string(),
            ply: self.game.ply(),
            fen: self.game.fen(),
            status,
            view: self.view,
        })
    }

    /// End the recording and return to the list. The moves stay available
    /// for [`Recorder::save`] until a new recording starts or the account
    /// changes.
    pub fn stop_recording(&mut self) -> Result<()> {
        self.sync_identity();
        self.require(View::Record, "stop recording")?;
        self.notices.push(Notice::success("Recording stopped"));
        self.finish_recording();
        Ok(())
    }

    fn finish_recording(&mut self) {
        self.timer.stop();
        self.log.seal();
        self.unsaved = true;
        self.view = View::List;
        info!(
            moves = self.log.len(),
            seconds = self.timer.value(),
            "Recording finished"
        );
    }

    pub fn pause_timer(&mut self) -> Result<TimerSnapshot> {
        self.sync_identity();
        self.require(View::Record, "pause the timer")?;
        self.timer.pause();
        Ok(self.timer.snapshot())
    }

    pub fn resume_timer(&mut self) -> Result<TimerSnapshot> {
        self.sync_identity();
        self.require(View::Record, "resume the timer")?;
        self.timer.resume();
        Ok(self.timer.snapshot())
    }

    /// Count one timer period by hand. Ignored unless the timer runs.
    pub fn tick(&self) -> u64 {
        self.timer.tick()
    }

    /// Persist the current recording under `title`.
    ///
    /// Allowed while recording, or from the list while a finished recording
    /// is unsaved. On any failure nothing changes and the caller may retry.
    pub async fn save(&mut self, title: &str) -> Result<i64> {
        self.pump_identity().await;
        let Some(identity) = self.identity.clone() else {
            self.notices.push(Notice::error("Sign-in required"));
            return Err(RecorderError::NotSignedIn);
        };
        match self.view {
            View::Record => {}
            View::List if self.unsaved => {}
            View::List => {
                self.notices.push(Notice::error("No recording to save"));
                return Err(RecorderError::NothingToSave);
            }
            _ => return Err(self.reject("save a recording")),
        }
        let title = title.trim();
        if title.is_empty() {
            self.notices.push(Notice::error("Please enter a title"));
            return Err(RecorderError::EmptyTitle);
        }

        let record = NewSavedGame {
            title: title.to_string(),
            moves: self.log.to_vec(),
            duration_secs: self.timer.value(),
            owner_id: identity.account_id,
            owner_label: Some(identity.email),
        };
        let moves = record.moves.len();
        match self.store.create(record).await {
            Ok(id) => {
                if self.view == View::Record {
                    self.timer.stop();
                    self.log.seal();
                }
                self.unsaved = false;
                self.view = View::List;
                info!(game_id = id, moves, "Recording saved");
                self.notices.push(Notice::success("Game saved"));
                let _ = self.refresh_list().await;
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "Failed to save recording");
                self.notices.push(Notice::error("Failed to save game"));
                Err(RecorderError::Persistence(e))
            }
        }
    }

    /// Load a saved game and show its initial position.
    pub async fn open_replay(&mut self, id: i64) -> Result<ReplayFrame> {
        self.pump_identity().await;
        self.require(View::List, "open a replay")?;
        let game = self.load_visible(id).await?;
        if let Err(e) = validate(&game.moves) {
            error!(game_id = id, error = %e, "Stored move log refused by rules engine");
            self.notices.push(Notice::error("Saved game is corrupt"));
            return Err(e.into());
        }

        info!(game_id = id, moves = game.moves.len(), "Replay opened");
        let cursor = ReplayCursor::new(game.moves.len());
        self.replay = Some(Replay { game, cursor });
        self.view = View::Replay;
        self.replay_frame()
    }

    /// Fetch a saved game the signed-in account may see, from any screen.
    pub async fn saved_game(&mut self, id: i64) -> Result<SavedGame> {
        self.pump_identity().await;
        if self.identity.is_none() {
            return Err(RecorderError::NotSignedIn);
        }
        self.load_visible(id).await
    }

    async fn load_visible(&mut self, id: i64) -> Result<SavedGame> {
        match self.store.get(id).await {
            Ok(Some(game)) if self.visible(&game) => Ok(game),
            Ok(_) => {
                warn!(game_id = id, "Saved game not found");
                self.notices.push(Notice::error("Game not found"));
                Err(RecorderError::NotFound(id))
            }
            Err(GatewayError::Malformed(reason)) => {
                error!(game_id = id, %reason, "Saved game is malformed");
                self.notices.push(Notice::error("Saved game is corrupt"));
                Err(RecorderError::Corrupt(reason))
            }
            Err(e) => {
                error!(game_id = id, error = %e, "Failed to load saved game");
                self.notices.push(Notice::error("Failed to load game"));
                Err(RecorderError::Persistence(e))
            }
        }
    }

    /// Step forward. At the last ply the cursor stays put.
    pub fn replay_next(&mut self) -> Result<ReplayFrame> {
        self.replay_mut("step forward")?.cursor.advance();
        self.replay_frame()
    }

    /// Step back. At the initial position the cursor stays put.
    pub fn replay_prev(&mut self) -> Result<ReplayFrame> {
        self.replay_mut("step back")?.cursor.retreat();
        self.replay_frame()
    }

    /// Jump to `ply`, clamped to the log length.
    pub fn replay_seek(&mut self, ply: usize) -> Result<ReplayFrame> {
        self.replay_mut("seek")?.cursor.seek(ply);
        self.replay_frame()
    }

    pub fn replay_frame(&self) -> Result<ReplayFrame> {
        let Some(replay) = self.replay.as_ref().filter(|_| self.view == View::Replay) else {
            return Err(self.reject("view a replay"));
        };
        let ply = replay.cursor.ply();
        let position = reconstruct(&replay.game.moves, ply)?;
        Ok(ReplayFrame {
            game_id: replay.game.id,
            title: replay.game.title.clone(),
            ply,
            total: replay.cursor.bound(),
            duration: chess_core::format_duration(replay.game.duration_secs),
            fen: position.fen(),
            board_fen: position.board_fen(),
            turn: position.turn(),
            last_move: ply
                .checked_sub(1)
                .and_then(|i| replay.game.moves.get(i).copied()),
            last_san: position.last_san().map(str::to_string),
            status: position.status(),
        })
    }

    fn replay_mut(&mut self, action: &'static str) -> Result<&mut Replay> {
        self.sync_identity();
        if self.view != View::Replay {
            return Err(self.reject(action));
        }
        match self.replay.as_mut() {
            Some(replay) => Ok(replay),
            None => Err(RecorderError::InvalidTransition {
                view: View::Replay,
                action,
            }),
        }
    }

    /// Leave the record or replay screen. Leaving a recording stops it.
    pub fn back(&mut self) -> Result<View> {
        self.sync_identity();
        match self.view {
            View::Record => {
                self.finish_recording();
            }
            View::Replay => {
                self.replay = None;
                self.view = View::List;
                debug!("Replay closed");
            }
            _ => return Err(self.reject("go back")),
        }
        Ok(self.view)
    }

    /// Remove a saved game and reload the list.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.pump_identity().await;
        self.require(View::List, "delete a saved game")?;
        let Some(account_id) = self.identity.as_ref().map(|i| i.account_id) else {
            return Err(RecorderError::NotSignedIn);
        };
        let game = self.load_visible(id).await?;
        if self.config.delete_policy == DeletePolicy::Owner && game.owner_id != account_id {
            warn!(game_id = id, account_id, "Refusing to delete another account's game");
            self.notices
                .push(Notice::error("You can only delete your own games"));
            return Err(RecorderError::Forbidden(id));
        }

        if let Err(e) = self.store.delete(id).await {
            error!(game_id = id, error = %e, "Failed to delete saved game");
            self.notices.push(Notice::error("Failed to delete game"));
            return Err(RecorderError::Persistence(e));
        }
        info!(game_id = id, "Saved game deleted");
        self.notices.push(Notice::success("Game deleted"));
        let _ = self.refresh_list().await;
        Ok(())
    }

    /// Stop the timer and unsubscribe from identity changes.
    pub fn shutdown(&mut self) {
        self.timer.stop();
        self.subscription = None;
        debug!("Recorder shut down");
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn games(&self) -> &[SavedGameSummary] {
        &self.games
    }

    pub fn moves(&self) -> &[RecordedMove] {
        self.log.as_slice()
    }

    pub fn has_unsaved_recording(&self) -> bool {
        self.unsaved
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn game(&self) -> &GameFacade {
        &self.game
    }

    /// Drain pending user-facing notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view,
            identity: self.identity.clone(),
            recording: RecordingSnapshot {
                fen: self.game.fen(),
                board_fen: self.game.board_fen(),
                turn: self.game.turn(),
                moves: self.log.to_vec(),
                move_count: self.log.len(),
                sealed: self.log.is_sealed(),
                unsaved: self.unsaved,
                status: self.game.status(),
                timer: self.timer.snapshot(),
            },
            replay: match self.view {
                View::Replay => self.replay_frame().ok(),
                _ => None,
            },
            games: self.games.clone(),
        }
    }

    fn visible(&self, game: &SavedGame) -> bool {
        match self.config.list_scope {
            ListScope::Global => true,
            ListScope::Owner => self
                .identity
                .as_ref()
                .is_some_and(|i| i.account_id == game.owner_id),
        }
    }

    fn require(&self, view: View, action: &'static str) -> Result<()> {
        if self.view == view {
            Ok(())
        } else {
            Err(self.reject(action))
        }
    }

    fn reject(&self, action: &'static str) -> RecorderError {
        warn!(view = %self.view, action, "Action not available on this screen");
        RecorderError::InvalidTransition {
            view: self.view,
            action,
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}
