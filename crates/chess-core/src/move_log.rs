use serde::Serialize;

use crate::moves::RecordedMove;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Move log is sealed")]
pub struct MoveLogSealed;

/// Append-only log of the moves of the game being recorded.
///
/// Index `n` is the position after `moves[0..n)`. A sealed log refuses
/// appends until [`MoveLog::clear`] starts a new recording.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveLog {
    moves: Vec<RecordedMove>,
    #[serde(skip)]
    sealed: bool,
}

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, mv: RecordedMove) -> Result<(), MoveLogSealed> {
        if self.sealed {
            return Err(MoveLogSealed);
        }
        self.moves.push(mv);
        Ok(())
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Empty the log and reopen it for appends.
    pub fn clear(&mut self) {
        self.moves.clear();
        self.sealed = false;
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecordedMove> {
        self.moves.get(index)
    }

    pub fn as_slice(&self) -> &[RecordedMove] {
        &self.moves
    }

    pub fn to_vec(&self) -> Vec<RecordedMove> {
        self.moves.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(uci: &str) -> RecordedMove {
        uci.parse().unwrap()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = MoveLog::new();
        log.append(mv("e2e4")).unwrap();
        log.append(mv("e7e5")).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0), Some(&mv("e2e4")));
        assert_eq!(log.get(1), Some(&mv("e7e5")));
        assert_eq!(log.get(2), None);
    }

    #[test]
    fn test_sealed_log_refuses_appends() {
        let mut log = MoveLog::new();
        log.append(mv("e2e4")).unwrap();
        log.seal();
        assert_eq!(log.append(mv("e7e5")), Err(MoveLogSealed));
        assert_eq!(log.to_vec(), vec![mv("e2e4")]);

        log.clear();
        assert!(log.is_empty());
        assert!(!log.is_sealed());
        log.append(mv("d2d4")).unwrap();
        assert_eq!(log.len(), 1);
    }
}
