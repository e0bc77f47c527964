use axum::{extract::Path, Extension, Json};
use chess_core::RecordedMove;
use recorder::{MoveOutcome, Notice, Recorder, RecorderError, SessionSnapshot};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::sessions::SessionRegistry;

/// Session state plus the notices raised since the last response.
#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    pub notices: Vec<Notice>,
}

pub fn respond(recorder: &mut Recorder) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: recorder.snapshot(),
        notices: recorder.take_notices(),
    })
}

/// Turn a failed action into the error response. Its notices go with it
/// rather than into the next successful response.
pub fn settle<T>(
    recorder: &mut Recorder,
    result: Result<T, RecorderError>,
) -> Result<T, AppError> {
    result.map_err(|e| {
        let dropped = recorder.take_notices();
        tracing::debug!(error = %e, notices = dropped.len(), "Action failed");
        e.into()
    })
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub outcome: MoveOutcome,
    #[serde(flatten)]
    pub session: SessionResponse,
}

#[derive(Deserialize)]
pub struct SaveRequest {
    pub title: String,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub id: i64,
    #[serde(flatten)]
    pub session: SessionResponse,
}

#[derive(Deserialize)]
pub struct SeekRequest {
    pub ply: usize,
}

/// GET /api/session
pub async fn get_session(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    recorder.pump_identity().await;
    Ok(respond(&mut recorder))
}

/// POST /api/session/recording
pub async fn start_recording(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.start_recording();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/recording/stop
pub async fn stop_recording(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.stop_recording();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/recording/pause
pub async fn pause_timer(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.pause_timer();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/recording/resume
pub async fn resume_timer(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.resume_timer();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/recording/save
pub async fn save_recording(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.save(&req.title).await;
    let id = settle(&mut recorder, result)?;
    let Json(session) = respond(&mut recorder);
    Ok(Json(SaveResponse { id, session }))
}

/// POST /api/session/moves
pub async fn make_move(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let mv = RecordedMove::from_parts(&req.from, &req.to, req.promotion.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.attempt_move(mv.from, mv.to, mv.promotion);
    let outcome = settle(&mut recorder, result)?;
    let Json(session) = respond(&mut recorder);
    Ok(Json(MoveResponse { outcome, session }))
}

/// POST /api/session/replay/{id}
pub async fn open_replay(
    Extension(sessions): Extension<SessionRegistry>,
    Path(game_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.open_replay(game_id).await;
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/replay/next
pub async fn replay_next(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.replay_next();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/replay/prev
pub async fn replay_prev(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.replay_prev();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/replay/seek
pub async fn replay_seek(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
    Json(req): Json<SeekRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.replay_seek(req.ply);
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}

/// POST /api/session/back
pub async fn back(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.back();
    settle(&mut recorder, result)?;
    Ok(respond(&mut recorder))
}
