//! On-screen model of the board: what is drawn where.
//!
//! The drag engine mutates this tree live while a card is being dragged, and
//! the final order is read back out of it on drop.

use ratatui::layout::Rect;
use ratatui::widgets::{Paragraph, Wrap};

use crate::store::{Board, Card, Column};

/// Rows taken by the trailing "+ Add a card" line
pub const ADD_CARD_HEIGHT: u16 = 1;
/// Rows taken by the add-card form when it is open
pub const ADD_FORM_HEIGHT: u16 = 3;
/// Most text lines a card shows before truncating
pub const MAX_CARD_TEXT_LINES: u16 = 4;

/// A card as laid out on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub card: Card,
    pub height: u16,
    /// Hidden cards stay in the tree but take no space
    pub hidden: bool,
}

impl CardView {
    pub fn new(card: Card, height: u16) -> Self {
        Self {
            card,
            height,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Card(CardView),
    /// Reserved space where a dragged card would land
    Placeholder { height: u16 },
}

impl Slot {
    /// Rows this slot occupies
    pub fn height(&self) -> u16 {
        match self {
            Slot::Card(view) if view.hidden => 0,
            Slot::Card(view) => view.height,
            Slot::Placeholder { height } => *height,
        }
    }

    pub fn card_id(&self) -> Option<i64> {
        match self {
            Slot::Card(view) => Some(view.card.id),
            Slot::Placeholder { .. } => None,
        }
    }
}

/// What lies under a screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    CardBody { column: Column, id: i64 },
    DeleteButton { column: Column, id: i64 },
    AddCard(Column),
    Placeholder(Column),
    ColumnBody(Column),
}

impl HitTarget {
    pub fn column(&self) -> Column {
        match *self {
            HitTarget::CardBody { column, .. }
            | HitTarget::DeleteButton { column, .. }
            | HitTarget::AddCard(column)
            | HitTarget::Placeholder(column)
            | HitTarget::ColumnBody(column) => column,
        }
    }
}

/// One column: bordered area, stacked slots, then the add-card affordance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub column: Column,
    pub area: Rect,
    pub slots: Vec<Slot>,
    pub footer_height: u16,
}

impl ColumnView {
    pub fn new(column: Column) -> Self {
        Self {
            column,
            area: Rect::default(),
            slots: vec![],
            footer_height: ADD_CARD_HEIGHT,
        }
    }

    /// Area inside the column border
    pub fn inner(&self) -> Rect {
        Rect {
            x: self.area.x.saturating_add(1),
            y: self.area.y.saturating_add(1),
            width: self.area.width.saturating_sub(2),
            height: self.area.height.saturating_sub(2),
        }
    }

    /// Screen rect of every slot, in order. Hidden cards get zero height.
    pub fn slot_rects(&self) -> Vec<Rect> {
        let inner = self.inner();
        let mut y = inner.y;
        self.slots
            .iter()
            .map(|slot| {
                let rect = Rect {
                    x: inner.x,
                    y,
                    width: inner.width,
                    height: slot.height(),
                };
                y = y.saturating_add(slot.height());
                rect
            })
            .collect()
    }

    /// Rect of the add-card affordance, right after the last slot
    pub fn footer_rect(&self) -> Rect {
        let inner = self.inner();
        let used: u16 = self
            .slots
            .iter()
            .fold(0u16, |acc, s| acc.saturating_add(s.height()));
        Rect {
            x: inner.x,
            y: inner.y.saturating_add(used),
            width: inner.width,
            height: self.footer_height,
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardView> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Card(view) => Some(view),
            Slot::Placeholder { .. } => None,
        })
    }

    pub fn card_slot(&self, id: i64) -> Option<usize> {
        self.slots.iter().position(|s| s.card_id() == Some(id))
    }

    pub fn placeholder_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Slot::Placeholder { .. }))
    }

    /// First visible card whose vertical midpoint is below `y`. Dropping at
    /// `y` means inserting before it; `None` means the end of the column.
    pub fn insertion_point(&self, y: u16) -> Option<i64> {
        let pointer = f32::from(y);
        self.slots
            .iter()
            .zip(self.slot_rects())
            .find_map(|(slot, rect)| match slot {
                Slot::Card(view) if !view.hidden => {
                    let middle = f32::from(rect.y) + f32::from(rect.height) / 2.0;
                    (pointer < middle).then_some(view.card.id)
                }
                _ => None,
            })
    }

    fn hit_test(&self, x: u16, y: u16) -> HitTarget {
        for (slot, rect) in self.slots.iter().zip(self.slot_rects()) {
            if !contains(rect, x, y) {
                continue;
            }
            return match slot {
                Slot::Card(view) if contains(delete_button_rect(rect), x, y) => {
                    HitTarget::DeleteButton {
                        column: self.column,
                        id: view.card.id,
                    }
                }
                Slot::Card(view) => HitTarget::CardBody {
                    column: self.column,
                    id: view.card.id,
                },
                Slot::Placeholder { .. } => HitTarget::Placeholder(self.column),
            };
        }
        if contains(self.footer_rect(), x, y) {
            return HitTarget::AddCard(self.column);
        }
        HitTarget::ColumnBody(self.column)
    }
}

/// The whole board as drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualTree {
    pub columns: Vec<ColumnView>,
}

impl VisualTree {
    /// Build the tree for `board`. Areas are zero until `set_column_areas`.
    pub fn from_board(board: &Board) -> Self {
        let columns = Column::all()
            .iter()
            .map(|&column| {
                let mut view = ColumnView::new(column);
                view.slots = board
                    .cards(column)
                    .iter()
                    .map(|card| Slot::Card(CardView::new(card.clone(), card_height(&card.text, 0))))
                    .collect();
                view
            })
            .collect();
        Self { columns }
    }

    /// Position columns on screen and size cards for the new width.
    /// Placeholders keep the height they were created with.
    pub fn set_column_areas(&mut self, areas: &[Rect]) {
        for (view, area) in self.columns.iter_mut().zip(areas) {
            view.area = *area;
            let width = view.inner().width;
            for slot in &mut view.slots {
                if let Slot::Card(card) = slot {
                    card.height = card_height(&card.card.text, width);
                }
            }
        }
    }

    /// Open or close the add-card form on `column`
    pub fn set_form_column(&mut self, column: Option<Column>) {
        for view in &mut self.columns {
            view.footer_height = if Some(view.column) == column {
                ADD_FORM_HEIGHT
            } else {
                ADD_CARD_HEIGHT
            };
        }
    }

    pub fn column(&self, column: Column) -> Option<&ColumnView> {
        self.columns.iter().find(|v| v.column == column)
    }

    fn column_mut(&mut self, column: Column) -> Option<&mut ColumnView> {
        self.columns.iter_mut().find(|v| v.column == column)
    }

    /// Topmost element at a screen position. The floating proxy is not part of
    /// the tree, so it never shadows what is beneath it.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<HitTarget> {
        self.columns
            .iter()
            .find(|view| contains(view.area, x, y))
            .map(|view| view.hit_test(x, y))
    }

    pub fn find_card(&self, id: i64) -> Option<(Column, &CardView)> {
        self.columns.iter().find_map(|view| {
            view.cards()
                .find(|c| c.card.id == id)
                .map(|c| (view.column, c))
        })
    }

    pub fn card_rect(&self, id: i64) -> Option<Rect> {
        self.columns.iter().find_map(|view| {
            view.card_slot(id).map(|idx| view.slot_rects()[idx])
        })
    }

    /// Hide a card in place; returns its column and slot index
    pub fn hide_card(&mut self, id: i64) -> Option<(Column, usize)> {
        self.set_card_hidden(id, true)
    }

    fn set_card_hidden(&mut self, id: i64, hidden: bool) -> Option<(Column, usize)> {
        for view in &mut self.columns {
            if let Some(idx) = view.card_slot(id) {
                if let Slot::Card(card) = &mut view.slots[idx] {
                    card.hidden = hidden;
                }
                return Some((view.column, idx));
            }
        }
        None
    }

    /// Column and slot index of the placeholder, if attached
    pub fn placeholder_position(&self) -> Option<(Column, usize)> {
        self.columns
            .iter()
            .find_map(|view| view.placeholder_slot().map(|idx| (view.column, idx)))
    }

    pub fn remove_placeholder(&mut self) -> Option<(Column, usize)> {
        let (column, idx) = self.placeholder_position()?;
        self.column_mut(column)?.slots.remove(idx);
        Some((column, idx))
    }

    /// Put a placeholder at slot `index` of `column`, detaching any existing one
    pub fn insert_placeholder(&mut self, column: Column, index: usize, height: u16) {
        self.remove_placeholder();
        if let Some(view) = self.column_mut(column) {
            let index = index.min(view.slots.len());
            view.slots.insert(index, Slot::Placeholder { height });
        }
    }

    /// Move the placeholder into `column`, directly before card `before`, or
    /// at the end of the column when `before` is `None` or not found there.
    pub fn move_placeholder(&mut self, column: Column, before: Option<i64>, height: u16) {
        self.remove_placeholder();
        if let Some(view) = self.column_mut(column) {
            let index = before
                .and_then(|id| view.card_slot(id))
                .unwrap_or(view.slots.len());
            view.slots.insert(index, Slot::Placeholder { height });
        }
    }

    /// Move card `id` into the placeholder's position, show it again and drop
    /// the placeholder. Returns the card's column and index among that
    /// column's cards.
    pub fn settle_card(&mut self, id: i64) -> Option<(Column, usize)> {
        self.placeholder_position()?;

        let mut taken = None;
        for view in &mut self.columns {
            if let Some(idx) = view.card_slot(id) {
                taken = Some(view.slots.remove(idx));
                break;
            }
        }
        let Some(Slot::Card(mut card)) = taken else {
            return None;
        };
        card.hidden = false;

        let (column, idx) = self.placeholder_position()?;
        let view = self.column_mut(column)?;
        view.slots[idx] = Slot::Card(card);
        let index = view
            .cards()
            .position(|c| c.card.id == id)
            .unwrap_or_default();
        Some((column, index))
    }

    /// Show a hidden card again where it is
    pub fn unhide_card(&mut self, id: i64) -> Option<(Column, usize)> {
        self.set_card_hidden(id, false)
    }

    /// Every card in display order, paired with its column
    pub fn snapshot(&self) -> Vec<(Column, Card)> {
        self.columns
            .iter()
            .flat_map(|view| view.cards().map(move |c| (view.column, c.card.clone())))
            .collect()
    }
}

/// Card text as the renderer lays it out: word-wrapped, edges trimmed
pub fn card_paragraph(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).wrap(Wrap { trim: true })
}

/// Text columns inside a card of `width`: two border columns plus the delete
/// button and its gap
pub fn card_text_width(width: u16) -> u16 {
    width.saturating_sub(4)
}

/// Rows a card needs at `width`: wrapped text plus top and bottom border
pub fn card_height(text: &str, width: u16) -> u16 {
    let lines = card_paragraph(text).line_count(card_text_width(width));
    let lines = u16::try_from(lines).unwrap_or(u16::MAX).clamp(1, MAX_CARD_TEXT_LINES);
    lines + 2
}

/// Hotspot of a card's delete button: two cells on the first text row,
/// just inside the right border
pub fn delete_button_rect(card: Rect) -> Rect {
    if card.width < 4 || card.height < 3 {
        return Rect::default();
    }
    Rect {
        x: card.x + card.width - 3,
        y: card.y + 1,
        width: 2,
        height: 1,
    }
}

fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && y >= rect.y
        && u32::from(x) < u32::from(rect.x) + u32::from(rect.width)
        && u32::from(y) < u32::from(rect.y) + u32::from(rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(todo: &[(i64, &str)]) -> Board {
        let mut board = Board::default();
        for (id, text) in todo {
            board.todo.push(Card::new(*id, *text));
        }
        board
    }

    fn laid_out(board: &Board) -> VisualTree {
        let mut tree = VisualTree::from_board(board);
        tree.set_column_areas(&[
            Rect::new(0, 0, 20, 30),
            Rect::new(20, 0, 20, 30),
            Rect::new(40, 0, 20, 30),
        ]);
        tree
    }

    #[test]
    fn test_card_height_wraps_and_caps() {
        assert_eq!(card_height("short", 20), 3);
        // 16 text columns at width 20
        assert_eq!(card_height(&"x".repeat(17), 20), 4);
        assert_eq!(card_height(&"x".repeat(500), 20), MAX_CARD_TEXT_LINES + 2);
        assert_eq!(card_height("", 20), 3);
    }

    #[test]
    fn test_card_height_follows_word_wrap() {
        // 29 chars fit two 16-column rows, but words only break three ways
        assert_eq!(card_height("aaaaaaaaa bbbbbbbbb ccccccccc", 20), 5);
        assert_eq!(card_height("one two three four", 20), 4);
    }

    #[test]
    fn test_card_height_counts_wide_chars() {
        // Eight double-width chars fill one 16-column row exactly
        assert_eq!(card_height(&"漢".repeat(8), 20), 3);
        assert_eq!(card_height(&"漢".repeat(9), 20), 4);
    }

    #[test]
    fn test_slots_stack_from_inner_top() {
        let tree = laid_out(&board_with(&[(1, "a"), (2, "b")]));
        let rects = tree.columns[0].slot_rects();
        assert_eq!(rects[0], Rect::new(1, 1, 18, 3));
        assert_eq!(rects[1], Rect::new(1, 4, 18, 3));
        assert_eq!(tree.columns[0].footer_rect(), Rect::new(1, 7, 18, 1));
    }

    #[test]
    fn test_hidden_card_takes_no_space() {
        let mut tree = laid_out(&board_with(&[(1, "a"), (2, "b")]));
        tree.hide_card(1);
        let rects = tree.columns[0].slot_rects();
        assert_eq!(rects[0].height, 0);
        assert_eq!(rects[1].y, 1);
    }

    #[test]
    fn test_hit_test_targets() {
        let tree = laid_out(&board_with(&[(1, "a")]));

        assert_eq!(
            tree.hit_test(5, 2),
            Some(HitTarget::CardBody { column: Column::Todo, id: 1 })
        );
        assert_eq!(
            tree.hit_test(17, 2),
            Some(HitTarget::DeleteButton { column: Column::Todo, id: 1 })
        );
        assert_eq!(tree.hit_test(5, 4), Some(HitTarget::AddCard(Column::Todo)));
        assert_eq!(tree.hit_test(5, 20), Some(HitTarget::ColumnBody(Column::Todo)));
        assert_eq!(tree.hit_test(45, 20), Some(HitTarget::ColumnBody(Column::Done)));
        assert_eq!(tree.hit_test(70, 5), None);
    }

    #[test]
    fn test_insertion_point_skips_hidden_cards() {
        let mut tree = laid_out(&board_with(&[(1, "a"), (2, "b")]));
        tree.hide_card(1);
        // Card 2 now sits at rows 1..4, midpoint 2.5
        assert_eq!(tree.columns[0].insertion_point(2), Some(2));
        assert_eq!(tree.columns[0].insertion_point(3), None);
    }

    #[test]
    fn test_move_placeholder_keeps_a_single_instance() {
        let mut tree = laid_out(&board_with(&[(1, "a"), (2, "b")]));
        tree.insert_placeholder(Column::Todo, 1, 3);
        tree.move_placeholder(Column::Done, None, 3);
        tree.move_placeholder(Column::Todo, Some(1), 3);

        assert_eq!(tree.placeholder_position(), Some((Column::Todo, 0)));
        let count: usize = tree
            .columns
            .iter()
            .map(|v| v.slots.iter().filter(|s| s.card_id().is_none()).count())
            .sum();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_settle_card_without_placeholder_is_none() {
        let mut tree = laid_out(&board_with(&[(1, "a")]));
        tree.hide_card(1);
        assert_eq!(tree.settle_card(1), None);
        assert!(tree.find_card(1).is_some());
    }

    #[test]
    fn test_snapshot_in_display_order() {
        let mut board = board_with(&[(1, "a"), (2, "b")]);
        board.done.push(Card::new(3, "c"));
        let tree = laid_out(&board);

        let snapshot = tree.snapshot();
        let ids: Vec<(Column, i64)> = snapshot.iter().map(|(c, card)| (*c, card.id)).collect();
        assert_eq!(ids, vec![(Column::Todo, 1), (Column::Todo, 2), (Column::Done, 3)]);
    }
}
