pub mod config;
pub mod drag;
pub mod logging;
pub mod store;
pub mod tui;
