use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moves::RecordedMove;

/// A recording as handed to the store. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedGame {
    pub title: String,
    pub moves: Vec<RecordedMove>,
    pub duration_secs: u64,
    pub owner_id: i64,
    pub owner_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub id: i64,
    pub title: String,
    pub moves: Vec<RecordedMove>,
    pub created_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub owner_id: i64,
    pub owner_label: Option<String>,
}

/// One row of the saved-games list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGameSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub duration: String,
    pub move_count: usize,
    pub owner_id: i64,
    pub owner_label: Option<String>,
}

impl SavedGame {
    pub fn from_new(id: i64, created_at: DateTime<Utc>, new: NewSavedGame) -> Self {
        Self {
            id,
            title: new.title,
            moves: new.moves,
            created_at,
            duration_secs: new.duration_secs,
            owner_id: new.owner_id,
            owner_label: new.owner_label,
        }
    }

    pub fn summary(&self) -> SavedGameSummary {
        SavedGameSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            duration_secs: self.duration_secs,
            duration: format_duration(self.duration_secs),
            move_count: self.moves.len(),
            owner_id: self.owner_id,
            owner_label: self.owner_label.clone(),
        }
    }
}

/// `m:ss`, minutes unbounded.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
