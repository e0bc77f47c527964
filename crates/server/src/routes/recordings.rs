use axum::{
    extract::{Path, Query},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chess_core::{pgn, reconstruct, GameStatus, RecordedMove, ReconstructionError, SavedGame, Side};
use recorder::RecorderError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::routes::session::settle;
use crate::sessions::SessionRegistry;

#[derive(Deserialize)]
pub struct PositionQuery {
    /// Defaults to the final position.
    pub ply: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub id: i64,
    pub ply: usize,
    pub total: usize,
    pub fen: String,
    pub board_fen: String,
    pub turn: Side,
    pub last_move: Option<RecordedMove>,
    pub last_san: Option<String>,
    pub status: GameStatus,
}

async fn load(sessions: &SessionRegistry, user: &AuthUser, id: i64) -> Result<SavedGame, AppError> {
    let session = sessions.for_user(user).await;
    let mut recorder = session.lock().await;
    let result = recorder.saved_game(id).await;
    settle(&mut recorder, result)
}

/// GET /api/recordings
pub async fn list_recordings(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.refresh_list().await.map(|games| games.to_vec());
    let games = settle(&mut recorder, result)?;

    Ok(Json(json!({
        "games": games,
        "total": games.len(),
    })))
}

/// GET /api/recordings/{id}
pub async fn get_recording(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<SavedGame>, AppError> {
    Ok(Json(load(&sessions, &user, id).await?))
}

/// GET /api/recordings/{id}/pgn
pub async fn get_recording_pgn(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let game = load(&sessions, &user, id).await?;
    let pgn = pgn::to_pgn(&game).map_err(RecorderError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-chess-pgn".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"recording-{id}.pgn\""),
            ),
        ],
        pgn,
    ))
}

/// GET /api/recordings/{id}/position?ply=N
pub async fn get_position(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<i64>,
    Query(q): Query<PositionQuery>,
    user: AuthUser,
) -> Result<Json<PositionResponse>, AppError> {
    let game = load(&sessions, &user, id).await?;
    let total = game.moves.len();
    let ply = q.ply.unwrap_or(total);

    let position = reconstruct(&game.moves, ply).map_err(|e| match e {
        ReconstructionError::OutOfRange { .. } => AppError::BadRequest(e.to_string()),
        ReconstructionError::Refused { .. } => RecorderError::from(e).into(),
    })?;

    Ok(Json(PositionResponse {
        id,
        ply,
        total,
        fen: position.fen(),
        board_fen: position.board_fen(),
        turn: position.turn(),
        last_move: ply.checked_sub(1).and_then(|i| game.moves.get(i).copied()),
        last_san: position.last_san().map(str::to_string),
        status: position.status(),
    }))
}

/// DELETE /api/recordings/{id}
pub async fn delete_recording(
    Extension(sessions): Extension<SessionRegistry>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let session = sessions.for_user(&user).await;
    let mut recorder = session.lock().await;
    let result = recorder.delete(id).await;
    settle(&mut recorder, result)?;

    Ok(Json(json!({
        "deleted": id,
        "games": recorder.games(),
    })))
}
