//! Recorded move type, the unit of a move log.
//!
//! Stored as `{"from": "e2", "to": "e4"}` with an optional `"promotion"`
//! letter (`q`, `r`, `b`, `n`). The UCI text form (`e2e4`, `e7e8q`) is used
//! for logging and for the HTTP surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{uci::UciMove, Role, Square};

/// A move accepted by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoveRepr", into = "MoveRepr")]
pub struct RecordedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseMoveError {
    #[error("Invalid square '{0}'")]
    Square(String),
    #[error("Invalid promotion piece '{0}'")]
    Promotion(String),
    #[error("Invalid move '{0}'")]
    Move(String),
}

impl RecordedMove {
    pub fn new(from: Square, to: Square, promotion: Option<Role>) -> Self {
        Self { from, to, promotion }
    }

    /// Build a move from square names as they arrive from a board UI.
    pub fn from_parts(from: &str, to: &str, promotion: Option<&str>) -> Result<Self, ParseMoveError> {
        Ok(Self {
            from: parse_square(from)?,
            to: parse_square(to)?,
            promotion: promotion.map(parse_promotion).transpose()?,
        })
    }

    pub fn to_uci(&self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

impl fmt::Display for RecordedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for RecordedMove {
    type Err = ParseMoveError;

    /// Parse UCI text: `e2e4`, `e7e8q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(ParseMoveError::Move(s.to_string()));
        }
        let promotion = if s.len() == 5 { Some(&s[4..5]) } else { None };
        Self::from_parts(&s[0..2], &s[2..4], promotion)
    }
}

fn parse_square(s: &str) -> Result<Square, ParseMoveError> {
    s.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| ParseMoveError::Square(s.to_string()))
}

fn parse_promotion(s: &str) -> Result<Role, ParseMoveError> {
    let mut chars = s.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => match Role::from_char(c.to_ascii_lowercase()) {
            Some(role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight)) => Ok(role),
            _ => Err(ParseMoveError::Promotion(s.to_string())),
        },
        _ => Err(ParseMoveError::Promotion(s.to_string())),
    }
}

/// Storage shape of a move.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MoveRepr {
    from: String,
    to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    promotion: Option<String>,
}

impl TryFrom<MoveRepr> for RecordedMove {
    type Error = ParseMoveError;

    fn try_from(repr: MoveRepr) -> Result<Self, Self::Error> {
        RecordedMove::from_parts(&repr.from, &repr.to, repr.promotion.as_deref())
    }
}

impl From<RecordedMove> for MoveRepr {
    fn from(mv: RecordedMove) -> Self {
        MoveRepr {
            from: mv.from.to_string(),
            to: mv.to.to_string(),
            promotion: mv.promotion.map(|r| r.char().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uci() {
        let mv: RecordedMove = "e2e4".parse().unwrap();
        assert_eq!(mv.from, Square::E2);
        assert_eq!(mv.to, Square::E4);
        assert_eq!(mv.promotion, None);

        let promo: RecordedMove = "e7e8q".parse().unwrap();
        assert_eq!(promo.promotion, Some(Role::Queen));
        assert_eq!(promo.to_string(), "e7e8q");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("e2".parse::<RecordedMove>().is_err());
        assert!("z9e4".parse::<RecordedMove>().is_err());
        assert!(matches!(
            "e7e8k".parse::<RecordedMove>(),
            Err(ParseMoveError::Promotion(_))
        ));
    }

    #[test]
    fn test_storage_shape() {
        let mv = RecordedMove::new(Square::G1, Square::F3, None);
        let json = serde_json::to_value(mv).unwrap();
        assert_eq!(json, serde_json::json!({"from": "g1", "to": "f3"}));

        let back: RecordedMove =
            serde_json::from_value(serde_json::json!({"from": "a7", "to": "a8", "promotion": "n"}))
                .unwrap();
        assert_eq!(back.promotion, Some(Role::Knight));
    }

    #[test]
    fn test_storage_rejects_bad_square() {
        let result: Result<RecordedMove, _> =
            serde_json::from_value(serde_json::json!({"from": "i9", "to": "e4"}));
        assert!(result.is_err());
    }
}
