//! Game facade over the `shakmaty` rules engine.
//!
//! The facade owns a single position and only moves forward. Earlier
//! positions are never restored in place; callers build a fresh facade and
//! replay a prefix of the move log instead (see [`crate::replay`]).

use std::collections::HashMap;

use serde::Serialize;
use shakmaty::{
    fen::Fen,
    san::{San, SanPlus, Suffix},
    Chess, Color, EnPassantMode, File, Move, Position, Rank, Role, Square,
};

use crate::moves::RecordedMove;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The rules engine refused a move. Carries the position it was tried in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Illegal move {mv} in position {fen}")]
pub struct IllegalMove {
    pub mv: RecordedMove,
    pub fen: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Side },
    Draw { reason: DrawReason },
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }
}

#[derive(Debug, Clone)]
pub struct GameFacade {
    position: Chess,
    ply: usize,
    last_san: Option<String>,
    /// Occurrences of each position, keyed by FEN without move counters.
    seen: HashMap<String, u32>,
}

impl GameFacade {
    pub fn new() -> Self {
        let position = Chess::default();
        let mut seen = HashMap::new();
        seen.insert(repetition_key(&position), 1);
        Self {
            position,
            ply: 0,
            last_san: None,
            seen,
        }
    }

    /// Try a move from a board interaction.
    ///
    /// A pawn reaching the last rank without a hint promotes to a queen; a
    /// hint on any other move is dropped. Castling is accepted as the king
    /// moving to its destination or onto its rook and is always recorded as
    /// the king's two-square move.
    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion_hint: Option<Role>,
    ) -> Result<RecordedMove, IllegalMove> {
        let promotion = self.normalize_promotion(from, to, promotion_hint);
        let candidate = RecordedMove::new(from, to, promotion);
        let legal = self.legal_move(&candidate)?;
        let recorded = normalize_castle(&legal).unwrap_or(candidate);
        self.play(legal);
        Ok(recorded)
    }

    /// Apply an already recorded move. Legality is still checked, so a
    /// corrupted entry is reported instead of producing a bogus position.
    pub fn apply(&mut self, mv: &RecordedMove) -> Result<(), IllegalMove> {
        let legal = self.legal_move(mv)?;
        self.play(legal);
        Ok(())
    }

    /// SAN of a move in the current position, with its check or mate
    /// suffix, if legal.
    pub fn san(&self, mv: &RecordedMove) -> Option<String> {
        let legal = self.legal_move(mv).ok()?;
        let san = San::from_move(&self.position, legal.clone());
        let mut after = self.position.clone();
        after.play_unchecked(legal);
        Some(san_plus(san, &after))
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    /// Piece placement only, as a board renderer needs it.
    pub fn board_fen(&self) -> String {
        self.position.board().to_string()
    }

    pub fn turn(&self) -> Side {
        self.position.turn().into()
    }

    /// SAN of the most recent move, if any.
    pub fn last_san(&self) -> Option<&str> {
        self.last_san.as_deref()
    }

    /// Plies played since the initial position.
    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    pub fn status(&self) -> GameStatus {
        if self.is_checkmate() {
            // The side to move is the side that got mated.
            let winner = Side::from(self.position.turn().other());
            return GameStatus::Checkmate { winner };
        }
        match self.draw_reason() {
            Some(reason) => GameStatus::Draw { reason },
            None => GameStatus::Ongoing,
        }
    }

    fn draw_reason(&self) -> Option<DrawReason> {
        if self.position.is_stalemate() {
            Some(DrawReason::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.position.halfmoves() >= 100 {
            Some(DrawReason::FiftyMoveRule)
        } else if self.repetitions() >= 3 {
            Some(DrawReason::ThreefoldRepetition)
        } else {
            None
        }
    }

    fn repetitions(&self) -> u32 {
        self.seen
            .get(&repetition_key(&self.position))
            .copied()
            .unwrap_or(0)
    }

    fn legal_move(&self, mv: &RecordedMove) -> Result<Move, IllegalMove> {
        mv.to_uci()
            .to_move(&self.position)
            .map_err(|_| IllegalMove {
                mv: *mv,
                fen: self.fen(),
            })
    }

    fn play(&mut self, mv: Move) {
        let san = San::from_move(&self.position, mv.clone());
        self.position.play_unchecked(mv);
        self.last_san = Some(san_plus(san, &self.position));
        self.ply += 1;
        *self.seen.entry(repetition_key(&self.position)).or_insert(0) += 1;
    }

    fn normalize_promotion(&self, from: Square, to: Square, hint: Option<Role>) -> Option<Role> {
        let pawn_moving = self
            .position
            .board()
            .piece_at(from)
            .is_some_and(|p| p.role == Role::Pawn && p.color == self.position.turn());
        let last_rank = match self.position.turn() {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        if pawn_moving && to.rank() == last_rank {
            Some(hint.unwrap_or(Role::Queen))
        } else {
            None
        }
    }
}

impl Default for GameFacade {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_castle(mv: &Move) -> Option<RecordedMove> {
    match mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Some(RecordedMove::new(
                *king,
                Square::from_coords(file, king.rank()),
                None,
            ))
        }
        _ => None,
    }
}

fn san_plus(san: San, after: &Chess) -> String {
    SanPlus {
        san,
        suffix: Suffix::from_position(after),
    }
    .to_string()
}

/// Position identity for repetition counting: placement, side, castling, ep.
fn repetition_key(pos: &Chess) -> String {
    let fen = Fen::from_position(pos, EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
