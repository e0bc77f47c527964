//! Postgres-backed saved-game store.

use async_trait::async_trait;
use chess_core::{NewSavedGame, RecordedMove, SavedGame};
use recorder::{GatewayError, ListQuery, PersistenceGateway};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
struct RecordingRow {
    id: i64,
    owner_id: i64,
    title: String,
    moves: JsonValue,
    duration_secs: i64,
    owner_label: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<RecordingRow> for SavedGame {
    type Error = GatewayError;

    fn try_from(row: RecordingRow) -> Result<Self, Self::Error> {
        let moves: Vec<RecordedMove> = serde_json::from_value(row.moves)
            .map_err(|e| GatewayError::Malformed(format!("recording {}: {e}", row.id)))?;
        let duration_secs = u64::try_from(row.duration_secs).map_err(|_| {
            GatewayError::Malformed(format!(
                "recording {}: negative duration {}",
                row.id, row.duration_secs
            ))
        })?;
        Ok(SavedGame {
            id: row.id,
            title: row.title,
            moves,
            created_at: row.created_at,
            duration_secs,
            owner_id: row.owner_id,
            owner_label: row.owner_label,
        })
    }
}

fn unavailable(e: sqlx::Error) -> GatewayError {
    GatewayError::Unavailable(format!("database: {e}"))
}

const RECORDING_COLUMNS: &str =
    "id, owner_id, title, moves, duration_secs, owner_label, created_at";

#[derive(Clone)]
pub struct PgRecordingStore {
    pool: PgPool,
}

impl PgRecordingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceGateway for PgRecordingStore {
    async fn create(&self, record: NewSavedGame) -> Result<i64, GatewayError> {
        let moves = serde_json::to_value(&record.moves)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let duration = i64::try_from(record.duration_secs)
            .map_err(|_| GatewayError::Malformed("duration out of range".into()))?;

        let row: (i64,) = sqlx::query_as(
            r#"INSERT INTO recordings (owner_id, title, moves, duration_secs, owner_label)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(record.owner_id)
        .bind(&record.title)
        .bind(moves)
        .bind(duration)
        .bind(&record.owner_label)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.0)
    }

    /// Rows that fail to decode are skipped so one bad record does not hide
    /// the rest of the list.
    async fn list(&self, query: ListQuery) -> Result<Vec<SavedGame>, GatewayError> {
        let rows = match query {
            ListQuery::Owner(owner_id) => {
                sqlx::query_as::<_, RecordingRow>(&format!(
                    "SELECT {RECORDING_COLUMNS} FROM recordings
                     WHERE owner_id = $1
                     ORDER BY created_at DESC, id DESC"
                ))
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
            }
            ListQuery::All => {
                sqlx::query_as::<_, RecordingRow>(&format!(
                    "SELECT {RECORDING_COLUMNS} FROM recordings
                     ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match SavedGame::try_from(row) {
                Ok(game) => Some(game),
                Err(e) => {
                    tracing::warn!("Skipping unreadable recording: {e}");
                    None
                }
            })
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<SavedGame>, GatewayError> {
        let row = sqlx::query_as::<_, RecordingRow>(&format!(
            "SELECT {RECORDING_COLUMNS} FROM recordings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(SavedGame::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM recordings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn row(moves: JsonValue, duration_secs: i64) -> RecordingRow {
        RecordingRow {
            id: 1,
            owner_id: 2,
            title: "Sicilian".into(),
            moves,
            duration_secs,
            owner_label: Some("a@b.dev".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_decodes() {
        let game = SavedGame::try_from(row(
            json!([{"from": "e2", "to": "e4"}, {"from": "c7", "to": "c5"}]),
            65,
        ))
        .unwrap();
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.moves[1].to_string(), "c7c5");
        assert_eq!(game.summary().duration, "1:05");
    }

    #[test]
    fn test_bad_rows_are_malformed() {
        let bad_square = SavedGame::try_from(row(json!([{"from": "z9", "to": "e4"}]), 0));
        assert!(matches!(bad_square, Err(GatewayError::Malformed(_))));

        let negative = SavedGame::try_from(row(json!([]), -1));
        assert!(matches!(negative, Err(GatewayError::Malformed(_))));
    }
}
