//! PGN export for saved recordings.

use crate::game::{GameFacade, GameStatus, Side};
use crate::game_data::{format_duration, SavedGame};
use crate::moves::RecordedMove;
use crate::replay::ReconstructionError;

/// Render SAN movetext ("1. e4 e5 2. Nf3") for a move log.
/// A refused entry aborts the export.
pub fn movetext(moves: &[RecordedMove]) -> Result<String, ReconstructionError> {
    let mut game = GameFacade::new();
    let mut out = String::new();

    for (ply, mv) in moves.iter().enumerate() {
        let san = game.san(mv).ok_or_else(|| ReconstructionError::Refused {
            ply,
            mv: *mv,
            fen: game.fen(),
        })?;
        if ply % 2 == 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("{}. {}", ply / 2 + 1, san));
        } else {
            out.push_str(&format!(" {}", san));
        }
        game.apply(mv).map_err(|e| ReconstructionError::Refused {
            ply,
            mv: *mv,
            fen: e.fen,
        })?;
    }

    Ok(out)
}

/// Result token of the final position of a log.
pub fn result_token(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Checkmate { winner: Side::White } => "1-0",
        GameStatus::Checkmate { winner: Side::Black } => "0-1",
        GameStatus::Draw { .. } => "1/2-1/2",
        GameStatus::Ongoing => "*",
    }
}

/// Full PGN document for a saved recording.
pub fn to_pgn(game: &SavedGame) -> Result<String, ReconstructionError> {
    let moves = movetext(&game.moves)?;
    let final_position = crate::replay::reconstruct(&game.moves, game.moves.len())?;
    let result = result_token(final_position.status());

    let mut headers = vec![
        ("Event", game.title.clone()),
        ("Site", "?".to_string()),
        ("Date", game.created_at.format("%Y.%m.%d").to_string()),
        ("Round", "-".to_string()),
        ("White", "?".to_string()),
        ("Black", "?".to_string()),
        ("Result", result.to_string()),
        ("Duration", format_duration(game.duration_secs)),
    ];
    if let Some(label) = &game.owner_label {
        headers.push(("Annotator", label.clone()));
    }

    let mut pgn = String::new();
    for (key, value) in headers {
        pgn.push_str(&format!("[{} \"{}\"]\n", key, escape_header(&value)));
    }
    pgn.push('\n');
    if moves.is_empty() {
        pgn.push_str(result);
    } else {
        pgn.push_str(&format!("{} {}", moves, result));
    }
    pgn.push('\n');
    Ok(pgn)
}

fn escape_header(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
