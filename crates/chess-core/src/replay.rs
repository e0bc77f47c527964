//! Replay cursor and position reconstruction.
//!
//! The position shown at cursor `C` is always rebuilt from the initial
//! position by replaying `moves[0..C)` on a fresh [`GameFacade`]. Nothing is
//! cached between cursor movements.

use serde::Serialize;

use crate::game::GameFacade;
use crate::moves::RecordedMove;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconstructionError {
    /// A stored entry was refused by the rules engine.
    #[error("Stored move {mv} at ply {ply} is not legal in position {fen}")]
    Refused {
        ply: usize,
        mv: RecordedMove,
        fen: String,
    },
    #[error("Ply {requested} is past the end of a {len}-move log")]
    OutOfRange { requested: usize, len: usize },
}

/// Index into a saved move log, bounded by `[0, bound]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayCursor {
    ply: usize,
    bound: usize,
}

impl ReplayCursor {
    pub fn new(len: usize) -> Self {
        Self { ply: 0, bound: len }
    }

    pub fn reset(&mut self, len: usize) {
        self.ply = 0;
        self.bound = len;
    }

    /// Returns whether the cursor moved.
    pub fn advance(&mut self) -> bool {
        if self.ply < self.bound {
            self.ply += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the cursor moved.
    pub fn retreat(&mut self) -> bool {
        if self.ply > 0 {
            self.ply -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a ply, clamped to the bound.
    pub fn seek(&mut self, ply: usize) {
        self.ply = ply.min(self.bound);
    }

    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn at_start(&self) -> bool {
        self.ply == 0
    }

    pub fn at_end(&self) -> bool {
        self.ply == self.bound
    }
}

/// Rebuild the position after `moves[0..upto)`.
pub fn reconstruct(moves: &[RecordedMove], upto: usize) -> Result<GameFacade, ReconstructionError> {
    if upto > moves.len() {
        return Err(ReconstructionError::OutOfRange {
            requested: upto,
            len: moves.len(),
        });
    }

    let mut game = GameFacade::new();
    for (ply, mv) in moves[..upto].iter().enumerate() {
        game.apply(mv).map_err(|e| ReconstructionError::Refused {
            ply,
            mv: *mv,
            fen: e.fen,
        })?;
    }
    Ok(game)
}

/// Check every entry of a stored log, reporting the first refused one.
pub fn validate(moves: &[RecordedMove]) -> Result<(), ReconstructionError> {
    reconstruct(moves, moves.len()).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::STARTING_FEN;

    fn moves(ucis: &[&str]) -> Vec<RecordedMove> {
        ucis.iter().map(|u| u.parse().unwrap()).collect()
    }

    #[test]
    fn test_cursor_bounds() {
        let mut cursor = ReplayCursor::new(2);
        assert!(!cursor.retreat());
        assert_eq!(cursor.ply(), 0);

        assert!(cursor.advance());
        assert!(cursor.advance());
        assert!(!cursor.advance());
        assert_eq!(cursor.ply(), 2);
        assert!(cursor.at_end());

        cursor.seek(10);
        assert_eq!(cursor.ply(), 2);

        cursor.reset(5);
        assert!(cursor.at_start());
        assert_eq!(cursor.bound(), 5);
    }

    #[test]
    fn test_empty_log_cursor() {
        let mut cursor = ReplayCursor::new(0);
        assert!(!cursor.advance());
        assert!(!cursor.retreat());
        assert!(cursor.at_start() && cursor.at_end());
    }

    #[test]
    fn test_reconstruct_matches_live_play() {
        let log = moves(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
        let mut live = GameFacade::new();
        for n in 0..=log.len() {
            let rebuilt = reconstruct(&log, n).unwrap();
            assert_eq!(rebuilt.fen(), live.fen(), "mismatch at ply {n}");
            if let Some(mv) = log.get(n) {
                live.attempt_move(mv.from, mv.to, mv.promotion).unwrap();
            }
        }
    }

    #[test]
    fn test_reconstruct_zero_is_start() {
        let log = moves(&["e2e4"]);
        assert_eq!(reconstruct(&log, 0).unwrap().fen(), STARTING_FEN);
    }

    #[test]
    fn test_corrupt_entry_is_reported() {
        let log = moves(&["e2e4", "e2e4", "g1f3"]);
        assert!(reconstruct(&log, 1).is_ok());
        match reconstruct(&log, 3) {
            Err(ReconstructionError::Refused { ply, mv, .. }) => {
                assert_eq!(ply, 1);
                assert_eq!(mv.to_string(), "e2e4");
            }
            other => panic!("expected refusal, got {other:?}"),
        }
        assert!(validate(&log).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let log = moves(&["e2e4"]);
        assert_eq!(
            reconstruct(&log, 2).unwrap_err(),
            ReconstructionError::OutOfRange {
                requested: 2,
                len: 1
            }
        );
    }
}
