mod board_store;
mod models;
mod schema;
mod storage;

pub use board_store::{next_card_id, BoardStore, BOARD_KEY};
pub use models::{Board, Card, Column};
pub use schema::Database;
pub use storage::{KeyValueStore, MemoryStorage, StorageError};

#[cfg(any(test, feature = "test-mocks"))]
pub use storage::MockKeyValueStore;
