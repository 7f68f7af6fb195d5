use anyhow::Result;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use std::io::{self, Stdout};

use crate::config::{Config, ThemeConfig};
use crate::drag::tree::{card_paragraph, card_text_width, delete_button_rect};
use crate::drag::{
    CursorIcon, DragEngine, DropOutcome, FloatingProxy, HitTarget, PointerCapture, Slot,
    VisualTree,
};
use crate::store::{BoardStore, Card, Column};

use super::board::BoardState;
use super::input::{InputMode, TextInput};

/// Helper to convert hex color string to ratatui Color
fn hex_to_color(hex: &str) -> Color {
    ThemeConfig::parse_hex(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::White)
}

/// Build footer help text based on current UI state
fn build_footer_text(input_mode: InputMode, cursor: CursorIcon) -> String {
    if cursor == CursorIcon::Grabbing {
        return " grabbing... [release] drop  [Esc] cancel ".to_string();
    }
    match input_mode {
        InputMode::Normal => {
            " [drag] move card  [a] add  [x] delete  [h/j/k/l] select  [q] quit ".to_string()
        }
        InputMode::AddCard(column) => {
            format!(" Add to {}... [Enter] add  [Esc] close ", column)
        }
    }
}

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 3;

/// Application state (separate from terminal for borrow checker)
struct AppState {
    should_quit: bool,
    title: String,
    board: BoardState,
    tree: VisualTree,
    column_areas: Vec<Rect>,
    input_mode: InputMode,
    input: TextInput,
    store: BoardStore,
    theme: ThemeConfig,
    capture: PointerCapture,
    drag: DragEngine,
}

pub struct App {
    terminal: Terminal,
    state: AppState,
}

impl App {
    pub fn new(store: BoardStore, config: &Config, title: impl Into<String>) -> Result<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let state = AppState::new(store, config.theme.clone(), title.into());
        Ok(Self { terminal, state })
    }

    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(title = %self.state.title, "board opened");

        while !self.state.should_quit {
            self.draw()?;

            if event::poll(std::time::Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.state.handle_key(key);
                    }
                    Event::Mouse(mouse) => self.state.handle_mouse(mouse),
                    Event::FocusLost => self.state.cancel_drag(),
                    _ => {}
                }
            }
        }

        self.state.cancel_drag();
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let state = &mut self.state;
        self.terminal.draw(|frame| {
            let area = frame.area();
            state.apply_layout(area);
            Self::draw_board(state, frame, area);
        })?;

        Ok(())
    }

    fn draw_board(state: &AppState, frame: &mut Frame, area: Rect) {
        let chunks = split_screen(area);

        // Header
        let header = Paragraph::new(format!(" kboard · {} ", state.title))
            .style(Style::default().fg(hex_to_color(&state.theme.color_accent)).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let dragging = state.drag.is_dragging();
        let selected_id = if dragging || state.input_mode != InputMode::Normal {
            None
        } else {
            state.board.selected_card().map(|c| c.id)
        };

        for (i, view) in state.tree.columns.iter().enumerate() {
            let is_selected_column = state.board.selected_column == i;
            let title = format!(" {} ({}) ", view.column, view.cards().count());
            let (border_style, title_style) = if is_selected_column {
                (
                    Style::default().fg(hex_to_color(&state.theme.color_selected)),
                    Style::default().fg(hex_to_color(&state.theme.color_selected)),
                )
            } else {
                (
                    Style::default().fg(hex_to_color(&state.theme.color_normal)),
                    Style::default().fg(hex_to_color(&state.theme.color_column_header)),
                )
            };

            let column_block = Block::default()
                .title(title)
                .title_style(title_style)
                .borders(Borders::ALL)
                .border_style(border_style);
            frame.render_widget(column_block, view.area);

            let inner = view.inner();
            let bottom = inner.y.saturating_add(inner.height);

            for (slot, rect) in view.slots.iter().zip(view.slot_rects()) {
                let Some(rect) = clip_to_bottom(rect, bottom) else {
                    continue;
                };
                match slot {
                    Slot::Card(card) if card.hidden => {}
                    Slot::Card(card) => {
                        let is_selected = selected_id == Some(card.card.id);
                        Self::draw_card(frame, &card.card, rect, is_selected, &state.theme);
                    }
                    Slot::Placeholder { .. } => {
                        let placeholder = Block::default()
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded)
                            .border_style(Style::default().fg(hex_to_color(&state.theme.color_dimmed)));
                        frame.render_widget(placeholder, rect);
                    }
                }
            }

            if let Some(footer) = clip_to_bottom(view.footer_rect(), bottom) {
                if state.input_mode.form_column() == Some(view.column) {
                    Self::draw_add_form(frame, &state.input, footer, &state.theme);
                } else {
                    let add = Paragraph::new(" + Add a card")
                        .style(Style::default().fg(hex_to_color(&state.theme.color_dimmed)));
                    frame.render_widget(add, footer);
                }
            }
        }

        if let Some(proxy) = state.drag.proxy() {
            Self::draw_proxy(frame, proxy, area, &state.theme);
        }

        // Footer
        let footer_text = build_footer_text(state.input_mode, state.capture.cursor());
        let footer = Paragraph::new(footer_text.as_str())
            .style(Style::default().fg(hex_to_color(&state.theme.color_dimmed)))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn draw_card(frame: &mut Frame, card: &Card, area: Rect, is_selected: bool, theme: &ThemeConfig) {
        let border_style = if is_selected {
            Style::default().fg(hex_to_color(&theme.color_selected))
        } else {
            Style::default().fg(hex_to_color(&theme.color_normal))
        };
        let border_type = if is_selected {
            BorderType::Thick
        } else {
            BorderType::Plain
        };
        Self::draw_card_frame(frame, card, area, border_style, border_type, theme);
    }

    fn draw_card_frame(
        frame: &mut Frame,
        card: &Card,
        area: Rect,
        border_style: Style,
        border_type: BorderType,
        theme: &ThemeConfig,
    ) {
        let card_block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .border_type(border_type);
        let inner = card_block.inner(area);
        frame.render_widget(card_block, area);

        let text_area = Rect {
            width: card_text_width(area.width),
            ..inner
        };
        let text = card_paragraph(&card.text)
            .style(Style::default().fg(hex_to_color(&theme.color_text)));
        frame.render_widget(text, text_area);

        let delete_area = delete_button_rect(area);
        if delete_area.width > 0 {
            let delete = Paragraph::new("✕")
                .style(Style::default().fg(hex_to_color(&theme.color_delete)));
            frame.render_widget(delete, delete_area);
        }
    }

    fn draw_add_form(frame: &mut Frame, input: &TextInput, area: Rect, theme: &ThemeConfig) {
        let block = Block::default()
            .title(" New card ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(hex_to_color(&theme.color_selected)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Keep the cursor visible by scrolling long input horizontally
        let width = usize::from(inner.width.max(1));
        let skip = (input.cursor() + 1).saturating_sub(width);
        let before: String = input.as_str().chars().skip(skip).take(input.cursor() - skip).collect();
        let after: String = input.as_str().chars().skip(input.cursor()).collect();
        let line = Line::from(vec![
            Span::raw(before),
            Span::styled("█", Style::default().fg(hex_to_color(&theme.color_accent))),
            Span::raw(after),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn draw_proxy(frame: &mut Frame, proxy: &FloatingProxy, screen: Rect, theme: &ThemeConfig) {
        let Some(area) = proxy_area(proxy, screen) else {
            return;
        };
        frame.render_widget(Clear, area);
        Self::draw_card_frame(
            frame,
            &proxy.card,
            area,
            Style::default().fg(hex_to_color(&theme.color_accent)),
            BorderType::Thick,
            theme,
        );
    }
}

impl AppState {
    fn new(store: BoardStore, theme: ThemeConfig, title: String) -> Self {
        let capture = PointerCapture::new();
        let mut state = Self {
            should_quit: false,
            title,
            board: BoardState::new(),
            tree: VisualTree::from_board(&Default::default()),
            column_areas: vec![],
            input_mode: InputMode::Normal,
            input: TextInput::default(),
            store,
            theme,
            drag: DragEngine::new(capture.clone()),
            capture,
        };
        state.refresh();
        state
    }

    /// Size the columns for `area`
    fn apply_layout(&mut self, area: Rect) {
        let chunks = split_screen(area);
        self.column_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(chunks[1])
            .to_vec();
        self.tree.set_column_areas(&self.column_areas);
        self.tree.set_form_column(self.input_mode.form_column());
    }

    /// Re-render from the store. Skipped mid-drag, where the tree is the
    /// source of truth.
    fn refresh(&mut self) {
        if self.drag.is_dragging() {
            return;
        }
        let board = self.store.load();
        self.tree = VisualTree::from_board(&board);
        self.tree.set_column_areas(&self.column_areas);
        self.tree.set_form_column(self.input_mode.form_column());
        self.board.set_board(board);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.drag.is_dragging() {
            if key.code == KeyCode::Esc {
                self.cancel_drag();
            }
            return;
        }

        match self.input_mode {
            InputMode::AddCard(column) => self.handle_form_key(column, key.code),
            InputMode::Normal => self.handle_normal_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Left => self.board.move_left(),
            KeyCode::Char('l') | KeyCode::Right => self.board.move_right(),
            KeyCode::Char('k') | KeyCode::Up => self.board.move_up(),
            KeyCode::Char('j') | KeyCode::Down => self.board.move_down(),
            KeyCode::Char('a') | KeyCode::Char('o') => {
                let column = self.board.selected_column();
                self.open_form(column);
            }
            KeyCode::Char('x') => {
                if let Some(card) = self.board.selected_card().cloned() {
                    self.delete_card(self.board.selected_column(), card.id);
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, column: Column, key: KeyCode) {
        match key {
            KeyCode::Esc => self.close_form(),
            KeyCode::Enter => self.submit_form(column),
            KeyCode::Left => self.input.left(),
            KeyCode::Right => self.input.right(),
            KeyCode::Home => self.input.home(),
            KeyCode::End => self.input.end(),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Char(c) => self.input.insert(c),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = (mouse.column, mouse.row);

        // Move and release belong to the drag session while it holds capture
        if self.capture.is_captured() {
            match mouse.kind {
                MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                    self.drag.pointer_move(&mut self.tree, x, y);
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    let outcome = self.drag.pointer_up(&mut self.tree, &self.store);
                    self.refresh();
                    if let DropOutcome::Committed { column, index } = outcome {
                        self.board.selected_column = column.index();
                        self.board.selected_row = index;
                    }
                }
                _ => {}
            }
            return;
        }

        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }

        // Clicking anywhere outside the column with the open form closes it
        if let Some(form_column) = self.input_mode.form_column() {
            let target_column = self.tree.hit_test(x, y).map(|t| t.column());
            if target_column != Some(form_column) {
                self.close_form();
            }
        }

        match self.tree.hit_test(x, y) {
            Some(HitTarget::DeleteButton { column, id }) => self.delete_card(column, id),
            Some(HitTarget::AddCard(column)) => {
                if self.input_mode.form_column() != Some(column) {
                    self.open_form(column);
                }
            }
            Some(HitTarget::CardBody { id, .. }) => {
                self.board.select_card(id);
                self.drag.pointer_down(&mut self.tree, x, y);
            }
            Some(HitTarget::ColumnBody(column)) | Some(HitTarget::Placeholder(column)) => {
                self.board.select_column(column.index());
            }
            None => {}
        }
    }

    fn open_form(&mut self, column: Column) {
        self.input_mode = InputMode::AddCard(column);
        self.input.clear();
        self.board.select_column(column.index());
        self.tree.set_form_column(Some(column));
    }

    fn close_form(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
        self.tree.set_form_column(None);
    }

    /// Add the typed card and keep the form open for the next one
    fn submit_form(&mut self, column: Column) {
        let Some(text) = self.input.submission().map(str::to_string) else {
            return;
        };
        match self.store.add_card(column, &text) {
            Ok(card) => {
                self.input.clear();
                self.refresh();
                self.board.select_card(card.id);
            }
            Err(err) => tracing::warn!(error = %err, "failed to add card"),
        }
    }

    fn delete_card(&mut self, column: Column, id: i64) {
        if let Err(err) = self.store.delete_card(column, id) {
            tracing::warn!(error = %err, id, "failed to delete card");
        }
        self.refresh();
    }

    fn cancel_drag(&mut self) {
        if self.drag.is_dragging() {
            self.drag.cancel(&mut self.tree);
            self.refresh();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
    }
}

/// Header, board and footer rows
fn split_screen(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area)
}

/// Cut `rect` off at row `bottom`; `None` when nothing is left
fn clip_to_bottom(rect: Rect, bottom: u16) -> Option<Rect> {
    if rect.height == 0 || rect.y >= bottom {
        return None;
    }
    Some(Rect {
        height: rect.height.min(bottom - rect.y),
        ..rect
    })
}

/// On-screen part of the floating proxy
fn proxy_area(proxy: &FloatingProxy, screen: Rect) -> Option<Rect> {
    let left = i32::from(screen.x);
    let top = i32::from(screen.y);
    let right = left + i32::from(screen.width);
    let bottom = top + i32::from(screen.height);

    let x0 = proxy.x.max(left);
    let y0 = proxy.y.max(top);
    let x1 = (proxy.x + i32::from(proxy.width)).min(right);
    let y1 = (proxy.y + i32::from(proxy.height)).min(bottom);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect {
        x: u16::try_from(x0).ok()?,
        y: u16::try_from(y0).ok()?,
        width: u16::try_from(x1 - x0).ok()?,
        height: u16::try_from(y1 - y0).ok()?,
    })
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
