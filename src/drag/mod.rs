//! Drag-and-drop of cards between and within columns.

mod capture;
mod engine;
pub mod tree;

pub use capture::{CaptureGuard, CursorIcon, PointerCapture};
pub use engine::{DragEngine, DragSession, DragState, DropOutcome, FloatingProxy};
pub use tree::{CardView, ColumnView, HitTarget, Slot, VisualTree};
