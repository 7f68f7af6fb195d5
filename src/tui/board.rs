use crate::store::{Board, Card, Column};

/// Keyboard selection over the board
#[derive(Debug)]
pub struct BoardState {
    pub board: Board,
    pub selected_column: usize,
    pub selected_row: usize,
}

impl BoardState {
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            selected_column: 0,
            selected_row: 0,
        }
    }

    /// Replace the board, keeping the selection in range
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.clamp_row();
    }

    /// Get cards in a specific column
    pub fn cards_in_column(&self, column: usize) -> &[Card] {
        match Column::all().get(column) {
            Some(c) => self.board.cards(*c),
            None => &[],
        }
    }

    pub fn selected_column(&self) -> Column {
        Column::all()
            .get(self.selected_column)
            .copied()
            .unwrap_or(Column::Todo)
    }

    /// Get the currently selected card
    pub fn selected_card(&self) -> Option<&Card> {
        self.cards_in_column(self.selected_column)
            .get(self.selected_row)
    }

    /// Point the selection at card `id`, wherever it is
    pub fn select_card(&mut self, id: i64) {
        if let Some((column, row)) = self.board.find(id) {
            self.selected_column = column.index();
            self.selected_row = row;
        }
    }

    /// Select column `column`, keeping the row in range
    pub fn select_column(&mut self, column: usize) {
        if column < Column::all().len() {
            self.selected_column = column;
            self.clamp_row();
        }
    }

    /// Move selection left
    pub fn move_left(&mut self) {
        if self.selected_column > 0 {
            self.selected_column -= 1;
            self.clamp_row();
        }
    }

    /// Move selection right
    pub fn move_right(&mut self) {
        if self.selected_column < Column::all().len() - 1 {
            self.selected_column += 1;
            self.clamp_row();
        }
    }

    /// Move selection up
    pub fn move_up(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
        }
    }

    /// Move selection down
    pub fn move_down(&mut self) {
        let column_count = self.cards_in_column(self.selected_column).len();
        if self.selected_row < column_count.saturating_sub(1) {
            self.selected_row += 1;
        }
    }

    /// Ensure selected_row is valid for current column
    fn clamp_row(&mut self) {
        let column_count = self.cards_in_column(self.selected_column).len();
        if column_count == 0 {
            self.selected_row = 0;
        } else if self.selected_row >= column_count {
            self.selected_row = column_count - 1;
        }
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
