use crate::store::{BoardStore, Card, Column};

use super::capture::{CaptureGuard, PointerCapture};
use super::tree::{HitTarget, VisualTree};

/// Clone of the dragged card that follows the pointer. Not part of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingProxy {
    pub card: Card,
    /// Top-left corner; may be off-screen to the left or top
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

/// Ephemeral state of one drag gesture
#[derive(Debug)]
pub struct DragSession {
    pub card_id: i64,
    pub origin: Column,
    /// Pointer position relative to the card's top-left corner
    pub offset: (u16, u16),
    pub proxy: FloatingProxy,
    pub placeholder_height: u16,
    capture: CaptureGuard,
}

impl DragSession {
    fn track(&mut self, x: u16, y: u16) {
        self.proxy.x = i32::from(x) - i32::from(self.offset.0);
        self.proxy.y = i32::from(y) - i32::from(self.offset.1);
    }
}

#[derive(Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Result of releasing the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Card landed at `index` in `column` and the order was committed
    Committed { column: Column, index: usize },
    /// Placeholder was gone at release; nothing restored or committed
    Aborted,
    NotDragging,
}

/// Pointer-driven reordering of cards within and across columns
#[derive(Debug, Default)]
pub struct DragEngine {
    state: DragState,
    capture: PointerCapture,
}

impl DragEngine {
    pub fn new(capture: PointerCapture) -> Self {
        Self {
            state: DragState::Idle,
            capture,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn proxy(&self) -> Option<&FloatingProxy> {
        self.session().map(|s| &s.proxy)
    }

    /// Start dragging the card under the pointer. Returns false when nothing
    /// started: already dragging, or not over a card body.
    pub fn pointer_down(&mut self, tree: &mut VisualTree, x: u16, y: u16) -> bool {
        if self.is_dragging() {
            return false;
        }
        let Some(HitTarget::CardBody { column, id }) = tree.hit_test(x, y) else {
            return false;
        };
        let (Some(rect), Some((_, view))) = (tree.card_rect(id), tree.find_card(id)) else {
            return false;
        };

        let offset = (x.saturating_sub(rect.x), y.saturating_sub(rect.y));
        let mut session = DragSession {
            card_id: id,
            origin: column,
            offset,
            proxy: FloatingProxy {
                card: view.card.clone(),
                x: 0,
                y: 0,
                width: rect.width,
                height: rect.height,
            },
            placeholder_height: rect.height,
            capture: self.capture.acquire(),
        };
        session.track(x, y);

        if let Some((column, idx)) = tree.hide_card(id) {
            tree.insert_placeholder(column, idx + 1, rect.height);
        }

        tracing::debug!(id, column = %column, "drag started");
        self.state = DragState::Dragging(session);
        true
    }

    /// Follow the pointer and keep the placeholder at the nearest boundary
    pub fn pointer_move(&mut self, tree: &mut VisualTree, x: u16, y: u16) {
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        session.track(x, y);

        let Some(target) = tree.hit_test(x, y) else {
            return;
        };
        let column = target.column();
        let height = session.placeholder_height;

        if tree.placeholder_position().map(|(c, _)| c) != Some(column) {
            tree.move_placeholder(column, None, height);
            tracing::debug!(column = %column, "placeholder moved to column");
        }

        let before = tree.column(column).and_then(|view| view.insertion_point(y));
        tree.move_placeholder(column, before, height);
    }

    /// Release the pointer: land the card where the placeholder is and commit
    /// the on-screen order of every column.
    pub fn pointer_up(&mut self, tree: &mut VisualTree, store: &BoardStore) -> DropOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DropOutcome::NotDragging;
        };
        let DragSession {
            card_id, capture, ..
        } = session;
        drop(capture);

        if tree.placeholder_position().is_none() {
            tracing::info!(id = card_id, "drag aborted, placeholder detached");
            return DropOutcome::Aborted;
        }

        let Some((column, index)) = tree.settle_card(card_id) else {
            tree.remove_placeholder();
            tracing::info!(id = card_id, "drag aborted, card no longer on board");
            return DropOutcome::Aborted;
        };

        if let Err(err) = store.commit_visual_order(&tree.snapshot()) {
            tracing::warn!(error = %err, "failed to persist card order");
        }
        tracing::info!(id = card_id, column = %column, index, "card dropped");
        DropOutcome::Committed { column, index }
    }

    /// End the session without committing, putting the card back where it
    /// started.
    pub fn cancel(&mut self, tree: &mut VisualTree) {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return;
        };
        tree.remove_placeholder();
        tree.unhide_card(session.card_id);
        tracing::debug!(id = session.card_id, "drag cancelled");
    }
}
