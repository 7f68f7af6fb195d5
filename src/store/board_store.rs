use anyhow::{Context, Result};

use super::models::{Board, Card, Column};
use super::storage::KeyValueStore;

/// Key the whole board is stored under
pub const BOARD_KEY: &str = "kboard-cards";

/// Repository for the board, persisted as one JSON record
pub struct BoardStore {
    backend: Box<dyn KeyValueStore>,
}

impl BoardStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Read the board. Missing, unreadable or malformed state yields an
    /// empty board; this never fails.
    pub fn load(&self) -> Board {
        let raw = match self.backend.get_item(BOARD_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Board::default(),
            Err(err) => {
                tracing::warn!(error = %err, "board read failed, using empty board");
                return Board::default();
            }
        };

        let parsed = serde_json::from_str::<serde_json::Value>(&raw).and_then(|value| {
            if value.is_object() {
                serde_json::from_value::<Board>(value)
            } else {
                Err(serde::de::Error::custom("board is not a JSON object"))
            }
        });

        match parsed {
            Ok(board) => {
                tracing::debug!(cards = board.len(), "board loaded");
                board
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored board is malformed, using empty board");
                Board::default()
            }
        }
    }

    /// Write the full board, replacing whatever was stored
    pub fn save(&self, board: &Board) -> Result<()> {
        let json = serde_json::to_string(board).context("Failed to serialize board")?;
        self.backend
            .set_item(BOARD_KEY, &json)
            .context("Failed to write board")?;
        tracing::debug!(cards = board.len(), "board saved");
        Ok(())
    }

    /// Append a new card to `column` and return it
    pub fn add_card(&self, column: Column, text: &str) -> Result<Card> {
        let mut board = self.load();
        let id = next_card_id(&board, chrono::Utc::now().timestamp_millis());
        let card = Card::new(id, text);
        board.cards_mut(column).push(card.clone());
        self.save(&board)?;
        tracing::info!(id, column = %column, "card added");
        Ok(card)
    }

    /// Remove the card with `id` from `column`. Unknown ids are ignored.
    pub fn delete_card(&self, column: Column, id: i64) -> Result<()> {
        let mut board = self.load();
        let before = board.cards(column).len();
        board.cards_mut(column).retain(|c| c.id != id);
        if board.cards(column).len() != before {
            tracing::info!(id, column = %column, "card deleted");
        }
        self.save(&board)
    }

    /// Rebuild the board from an ordered (column, card) snapshot of what is on
    /// screen and persist it. Prior column assignments are discarded.
    pub fn commit_visual_order(&self, snapshot: &[(Column, Card)]) -> Result<Board> {
        let mut board = Board::default();
        for (column, card) in snapshot {
            board.cards_mut(*column).push(card.clone());
        }
        self.save(&board)?;
        Ok(board)
    }
}

/// Timestamp-based id, bumped past the largest id already on the board so
/// cards created within the same millisecond stay distinct.
pub fn next_card_id(board: &Board, now_ms: i64) -> i64 {
    match board.max_id() {
        Some(max) if max >= now_ms => max + 1,
        _ => now_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::{MemoryStorage, MockKeyValueStore};

    fn memory_store() -> BoardStore {
        BoardStore::new(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_next_card_id_uses_timestamp() {
        let board = Board::default();
        assert_eq!(next_card_id(&board, 1_700_000_000_000), 1_700_000_000_000);
    }

    #[test]
    fn test_next_card_id_bumps_on_collision() {
        let mut board = Board::default();
        board.todo.push(Card::new(500, "a"));
        board.done.push(Card::new(900, "b"));
        assert_eq!(next_card_id(&board, 900), 901);
        assert_eq!(next_card_id(&board, 100), 901);
        assert_eq!(next_card_id(&board, 1000), 1000);
    }

    #[test]
    fn test_load_backend_error_gives_default() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get_item()
            .returning(|_| Err(anyhow::anyhow!("disk on fire")));
        let store = BoardStore::new(Box::new(mock));

        assert_eq!(store.load(), Board::default());
    }

    #[test]
    fn test_save_writes_under_board_key() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_set_item()
            .withf(|key: &str, value: &str| key == BOARD_KEY && value.contains("\"IN PROGRESS\""))
            .times(1)
            .returning(|_, _| Ok(()));
        let store = BoardStore::new(Box::new(mock));

        store.save(&Board::default()).unwrap();
    }

    #[test]
    fn test_save_error_is_returned() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_set_item()
            .returning(|_, _| Err(anyhow::anyhow!("read-only")));
        let store = BoardStore::new(Box::new(mock));

        assert!(store.save(&Board::default()).is_err());
    }

    #[test]
    fn test_add_card_ids_unique_in_quick_succession() {
        let store = memory_store();
        let ids: Vec<i64> = (0..20)
            .map(|i| store.add_card(Column::Todo, &format!("card {}", i)).unwrap().id)
            .collect();

        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }
}
