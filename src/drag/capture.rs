use std::cell::Cell;
use std::rc::Rc;

/// Pointer cursor shown by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    #[default]
    Default,
    Grabbing,
}

/// Shared handle the event loop consults to decide whether pointer move/up
/// events belong to a drag session.
#[derive(Debug, Clone, Default)]
pub struct PointerCapture {
    active: Rc<Cell<bool>>,
}

impl PointerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route pointer events to the caller until the guard is dropped
    pub fn acquire(&self) -> CaptureGuard {
        self.active.set(true);
        CaptureGuard {
            active: Rc::clone(&self.active),
        }
    }

    pub fn is_captured(&self) -> bool {
        self.active.get()
    }

    pub fn cursor(&self) -> CursorIcon {
        if self.is_captured() {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Default
        }
    }
}

/// Live pointer capture; releasing happens on drop
#[derive(Debug)]
pub struct CaptureGuard {
    active: Rc<Cell<bool>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.active.set(false);
    }
}
