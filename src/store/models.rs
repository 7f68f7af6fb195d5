use serde::{Deserialize, Serialize};

/// One of the three fixed board columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "TODO")]
    Todo,
    #[serde(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "DONE")]
    Done,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Todo => "TODO",
            Column::InProgress => "IN PROGRESS",
            Column::Done => "DONE",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(Column::Todo),
            "IN PROGRESS" => Some(Column::InProgress),
            "DONE" => Some(Column::Done),
            _ => None,
        }
    }

    /// Columns in display order, left to right
    pub fn all() -> &'static [Column] {
        &[Column::Todo, Column::InProgress, Column::Done]
    }

    pub fn index(&self) -> usize {
        match self {
            Column::Todo => 0,
            Column::InProgress => 1,
            Column::Done => 2,
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Creation timestamp in milliseconds, unique within a board
    pub id: i64,
    pub text: String,
}

impl Card {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Column name to ordered cards. Serializes as
/// `{"TODO": [...], "IN PROGRESS": [...], "DONE": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(rename = "TODO", default)]
    pub todo: Vec<Card>,
    #[serde(rename = "IN PROGRESS", default)]
    pub in_progress: Vec<Card>,
    #[serde(rename = "DONE", default)]
    pub done: Vec<Card>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self, column: Column) -> &[Card] {
        match column {
            Column::Todo => &self.todo,
            Column::InProgress => &self.in_progress,
            Column::Done => &self.done,
        }
    }

    pub fn cards_mut(&mut self, column: Column) -> &mut Vec<Card> {
        match column {
            Column::Todo => &mut self.todo,
            Column::InProgress => &mut self.in_progress,
            Column::Done => &mut self.done,
        }
    }

    /// Locate a card by id, returning its column and index
    pub fn find(&self, id: i64) -> Option<(Column, usize)> {
        Column::all().iter().find_map(|&column| {
            self.cards(column)
                .iter()
                .position(|c| c.id == id)
                .map(|idx| (column, idx))
        })
    }

    /// Total number of cards across all columns
    pub fn len(&self) -> usize {
        Column::all().iter().map(|&c| self.cards(c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest card id on the board, if any
    pub fn max_id(&self) -> Option<i64> {
        Column::all()
            .iter()
            .flat_map(|&c| self.cards(c).iter().map(|card| card.id))
            .max()
    }
}
