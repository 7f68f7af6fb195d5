mod app;
pub mod board;
pub mod input;

pub use app::App;
