//! Unit tests for app.rs event handling

use super::*;
use crate::store::{Board, MemoryStorage, MockKeyValueStore};

fn test_state() -> AppState {
    let store = BoardStore::new(Box::new(MemoryStorage::new()));
    let mut state = AppState::new(store, ThemeConfig::default(), "test".to_string());
    state.apply_layout(Rect::new(0, 0, 90, 40));
    state
}

fn mouse(kind: MouseEventKind, x: u16, y: u16) -> MouseEvent {
    MouseEvent {
        kind,
        column: x,
        row: y,
        modifiers: KeyModifiers::NONE,
    }
}

fn press(x: u16, y: u16) -> MouseEvent {
    mouse(MouseEventKind::Down(MouseButton::Left), x, y)
}

fn drag(x: u16, y: u16) -> MouseEvent {
    mouse(MouseEventKind::Drag(MouseButton::Left), x, y)
}

fn release(x: u16, y: u16) -> MouseEvent {
    mouse(MouseEventKind::Up(MouseButton::Left), x, y)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(state: &mut AppState, text: &str) {
    for c in text.chars() {
        state.handle_key(key(KeyCode::Char(c)));
    }
}

fn card_center(state: &AppState, id: i64) -> (u16, u16) {
    let rect = state.tree.card_rect(id).unwrap();
    (rect.x + 2, rect.y + rect.height / 2)
}

fn texts(board: &Board, column: Column) -> Vec<String> {
    board.cards(column).iter().map(|c| c.text.clone()).collect()
}

#[test]
fn test_footer_text_per_mode() {
    assert!(build_footer_text(InputMode::Normal, CursorIcon::Default).contains("[a] add"));
    assert!(build_footer_text(InputMode::AddCard(Column::Done), CursorIcon::Default).contains("DONE"));
    assert!(build_footer_text(InputMode::Normal, CursorIcon::Grabbing).contains("grabbing"));
}

#[test]
fn test_keyboard_add_card_keeps_form_open() {
    let mut state = test_state();

    state.handle_key(key(KeyCode::Char('a')));
    assert_eq!(state.input_mode, InputMode::AddCard(Column::Todo));

    type_text(&mut state, "  Write spec  ");
    state.handle_key(key(KeyCode::Enter));

    let board = state.store.load();
    assert_eq!(texts(&board, Column::Todo), vec!["Write spec"]);
    assert_eq!(state.input_mode, InputMode::AddCard(Column::Todo));
    assert_eq!(state.input.as_str(), "");
}

#[test]
fn test_blank_submission_is_ignored() {
    let mut state = test_state();
    state.handle_key(key(KeyCode::Char('a')));
    type_text(&mut state, "   ");
    state.handle_key(key(KeyCode::Enter));

    assert!(state.store.load().is_empty());
}

#[test]
fn test_escape_closes_and_clears_form() {
    let mut state = test_state();
    state.handle_key(key(KeyCode::Char('a')));
    type_text(&mut state, "draft");
    state.handle_key(key(KeyCode::Esc));

    assert_eq!(state.input_mode, InputMode::Normal);
    assert_eq!(state.input.as_str(), "");
    assert!(state.store.load().is_empty());
}

#[test]
fn test_click_add_affordance_opens_form() {
    let mut state = test_state();
    let footer = state.tree.column(Column::InProgress).unwrap().footer_rect();

    state.handle_mouse(press(footer.x + 1, footer.y));

    assert_eq!(state.input_mode, InputMode::AddCard(Column::InProgress));
    assert_eq!(state.board.selected_column, 1);
}

#[test]
fn test_click_outside_form_column_closes_form() {
    let mut state = test_state();
    state.handle_key(key(KeyCode::Char('a')));
    type_text(&mut state, "half typed");

    let done = state.tree.column(Column::Done).unwrap().area;
    state.handle_mouse(press(done.x + 2, done.y + done.height - 2));

    assert_eq!(state.input_mode, InputMode::Normal);
    assert_eq!(state.input.as_str(), "");
}

#[test]
fn test_click_inside_form_column_keeps_form() {
    let mut state = test_state();
    state.handle_key(key(KeyCode::Char('a')));
    type_text(&mut state, "half typed");

    let todo = state.tree.column(Column::Todo).unwrap().area;
    state.handle_mouse(press(todo.x + 2, todo.y + todo.height - 2));

    assert_eq!(state.input_mode, InputMode::AddCard(Column::Todo));
    assert_eq!(state.input.as_str(), "half typed");
}

#[test]
fn test_delete_button_removes_card_without_dragging() {
    let mut state = test_state();
    let card = state.store.add_card(Column::Todo, "doomed").unwrap();
    state.refresh();

    let rect = state.tree.card_rect(card.id).unwrap();
    let button = delete_button_rect(rect);
    state.handle_mouse(press(button.x, button.y));

    assert!(!state.drag.is_dragging());
    assert!(!state.capture.is_captured());
    assert!(state.store.load().is_empty());
}

#[test]
fn test_keyboard_delete_selected() {
    let mut state = test_state();
    state.store.add_card(Column::Todo, "one").unwrap();
    state.store.add_card(Column::Todo, "two").unwrap();
    state.refresh();

    state.handle_key(key(KeyCode::Char('j')));
    state.handle_key(key(KeyCode::Char('x')));

    assert_eq!(texts(&state.store.load(), Column::Todo), vec!["one"]);
    assert_eq!(state.board.selected_row, 0);
}

#[test]
fn test_mouse_drag_moves_card_across_columns() {
    let mut state = test_state();
    let card = state.store.add_card(Column::Todo, "Write spec").unwrap();
    state.refresh();

    let (x, y) = card_center(&state, card.id);
    state.handle_mouse(press(x, y));
    assert!(state.capture.is_captured());

    let done = state.tree.column(Column::Done).unwrap().inner();
    state.handle_mouse(drag(done.x + 3, done.y + 1));
    state.handle_mouse(release(done.x + 3, done.y + 1));

    let board = state.store.load();
    assert!(board.todo.is_empty());
    assert_eq!(texts(&board, Column::Done), vec!["Write spec"]);
    assert!(!state.capture.is_captured());
    assert_eq!(state.board.selected_column, 2);
    assert_eq!(state.board.selected_row, 0);
}

#[test]
fn test_failed_drop_write_shows_stored_order() {
    let mut stored = Board::default();
    stored.todo.push(Card::new(1, "Write spec"));
    let json = serde_json::to_string(&stored).unwrap();

    let mut mock = MockKeyValueStore::new();
    mock.expect_get_item()
        .returning(move |_| Ok(Some(json.clone())));
    mock.expect_set_item()
        .times(1)
        .returning(|_, _| Err(anyhow::anyhow!("quota exceeded")));

    let store = BoardStore::new(Box::new(mock));
    let mut state = AppState::new(store, ThemeConfig::default(), "test".to_string());
    state.apply_layout(Rect::new(0, 0, 90, 40));

    let (x, y) = card_center(&state, 1);
    state.handle_mouse(press(x, y));
    let done = state.tree.column(Column::Done).unwrap().inner();
    state.handle_mouse(drag(done.x + 3, done.y + 1));
    state.handle_mouse(release(done.x + 3, done.y + 1));

    assert!(!state.capture.is_captured());
    assert_eq!(state.tree.find_card(1).map(|(c, _)| c), Some(Column::Todo));
    assert_eq!(state.board.selected_column(), Column::Todo);
}

#[test]
fn test_events_outside_capture_do_not_move_cards() {
    let mut state = test_state();
    state.store.add_card(Column::Todo, "stay").unwrap();
    state.refresh();
    let before = state.store.load();

    let done = state.tree.column(Column::Done).unwrap().inner();
    state.handle_mouse(drag(done.x + 3, done.y + 1));
    state.handle_mouse(release(done.x + 3, done.y + 1));

    assert_eq!(state.store.load(), before);
}

#[test]
fn test_escape_cancels_drag() {
    let mut state = test_state();
    let card = state.store.add_card(Column::Todo, "stay").unwrap();
    state.refresh();
    let before = state.store.load();

    let (x, y) = card_center(&state, card.id);
    state.handle_mouse(press(x, y));
    let done = state.tree.column(Column::Done).unwrap().inner();
    state.handle_mouse(drag(done.x + 3, done.y + 1));
    state.handle_key(key(KeyCode::Esc));

    assert!(!state.drag.is_dragging());
    assert!(!state.capture.is_captured());
    assert_eq!(state.store.load(), before);
    assert!(state.tree.placeholder_position().is_none());
    assert!(state.tree.find_card(card.id).is_some_and(|(_, v)| !v.hidden));
}

#[test]
fn test_refresh_is_skipped_mid_drag() {
    let mut state = test_state();
    let card = state.store.add_card(Column::Todo, "moving").unwrap();
    state.refresh();

    let (x, y) = card_center(&state, card.id);
    state.handle_mouse(press(x, y));
    state.refresh();

    assert!(state.tree.placeholder_position().is_some());
}

#[test]
fn test_proxy_area_clips_to_screen() {
    let proxy = FloatingProxy {
        card: Card::new(1, "x"),
        x: -3,
        y: 2,
        width: 10,
        height: 3,
    };
    let screen = Rect::new(0, 0, 80, 24);
    assert_eq!(proxy_area(&proxy, screen), Some(Rect::new(0, 2, 7, 3)));

    let gone = FloatingProxy { x: -20, ..proxy };
    assert_eq!(proxy_area(&gone, screen), None);
}

#[test]
fn test_clip_to_bottom() {
    assert_eq!(clip_to_bottom(Rect::new(0, 5, 10, 3), 7), Some(Rect::new(0, 5, 10, 2)));
    assert_eq!(clip_to_bottom(Rect::new(0, 7, 10, 3), 7), None);
    assert_eq!(clip_to_bottom(Rect::new(0, 2, 10, 0), 7), None);
}
